//! Client side of the chat sync protocol.
//!
//! A [`ChatSession`] drives one conversation through
//! Draft → Created → Streaming → Appending → Appended, talking to the chat
//! backend through [`ChatBackend`] and to the generative model through
//! [`ModelStream`]. Model output is only persisted once a stream has
//! completed; an abandoned stream leaves the stored history untouched, and
//! a round abandoned while its append is in flight is reconciled against
//! the stored history before the next operation.

pub mod backend;
pub mod model;
pub mod session;

use crate::storage::RepositoryError;

pub use backend::{ChatBackend, HttpChatBackend, LocalChatBackend};
pub use model::{replay_context, ModelError, ModelStream, TextStream};
pub use session::{ChatSession, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Conversation not found: {0}")]
    NotFound(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Store error: {0}")]
    Store(RepositoryError),
    #[error("Operation not allowed while {0:?}")]
    InvalidState(SessionState),
}

impl From<RepositoryError> for SyncError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::Store(other),
        }
    }
}
