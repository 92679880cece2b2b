pub mod db;
pub mod entities;
pub mod repository;

pub use db::{close_db, init_db};
pub use entities::{chat_turns, chats, user_chat_entries, user_chats};
pub use repository::{ConversationStore, RepositoryError, SeaOrmChatRepository, UserIndex};
