//! Parley - chat history server and sync protocol client

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod services;
pub mod storage;
pub mod sync;

// Re-export main types for convenience
pub use crate::api::routes::{create_router, AppState};
pub use crate::auth::{AuthUser, TokenVerifier};
pub use crate::config::Config;
pub use crate::models::internal::{
    AppendAck, ChatSummary, Conversation, Part, Role, Turn, UploadAuthParams, UserChats,
};
pub use crate::services::{ChatService, UploadSigner};
pub use crate::storage::{
    init_db, ConversationStore, RepositoryError, SeaOrmChatRepository, UserIndex,
};
pub use crate::sync::{ChatBackend, ChatSession, SessionState, SyncError};
