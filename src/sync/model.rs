use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::models::internal::{Part, Turn};

/// Incremental text produced by the model for one prompt.
pub type TextStream = BoxStream<'static, Result<String, ModelError>>;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Request(String),
    #[error("Model stream interrupted: {0}")]
    Stream(String),
}

/// A streaming generative model. Implementations live outside this crate;
/// the session only needs the role-tagged context and the new prompt.
#[async_trait]
pub trait ModelStream: Send + Sync {
    async fn stream(&self, context: &[Turn], prompt: &Turn) -> Result<TextStream, ModelError>;
}

#[async_trait]
impl<T: ModelStream + ?Sized> ModelStream for Arc<T> {
    async fn stream(&self, context: &[Turn], prompt: &Turn) -> Result<TextStream, ModelError> {
        (**self).stream(context, prompt).await
    }
}

/// History as it is replayed to the model: first text part only, images
/// dropped.
pub fn replay_context(history: &[Turn]) -> Vec<Turn> {
    history
        .iter()
        .map(|turn| Turn {
            role: turn.role,
            parts: vec![Part::text(turn.first_text())],
            img: None,
        })
        .collect()
}
