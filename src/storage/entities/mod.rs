pub mod chat_turns;
pub mod chats;
pub mod user_chat_entries;
pub mod user_chats;
