use std::sync::Arc;

use crate::models::internal::{AppendAck, ChatSummary, Conversation, Turn, UserChats};
use crate::storage::{ConversationStore, RepositoryError, UserIndex};

/// Server half of the sync protocol: turns client requests into store and
/// index operations.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    index: Arc<dyn UserIndex>,
    title_max_chars: usize,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        index: Arc<dyn UserIndex>,
        title_max_chars: usize,
    ) -> Self {
        Self {
            store,
            index,
            title_max_chars,
        }
    }

    /// Creates a conversation and records it in the owner's index.
    ///
    /// The two writes are sequential, not one transaction. If the index
    /// write fails the conversation exists but is unlisted; that is logged
    /// and reported as a failure.
    pub async fn create_chat(
        &self,
        owner: &str,
        text: &str,
    ) -> Result<Conversation, RepositoryError> {
        if text.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("text must not be blank".to_string()));
        }

        let conv = self.store.create(owner, text).await?;
        let summary = ChatSummary::for_conversation(&conv, self.title_max_chars);

        if let Err(e) = self.index.ensure_entry(owner, summary).await {
            tracing::error!(
                chat_id = %conv.id,
                owner,
                "Conversation created but not indexed: {}",
                e
            );
            return Err(e);
        }

        Ok(conv)
    }

    pub async fn get_chat(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        self.store.get(id, owner).await
    }

    pub async fn list_user_chats(&self, owner: &str) -> Result<Vec<UserChats>, RepositoryError> {
        self.index.list_entries(owner).await
    }

    /// Appends one completed round. The user turn is included only when
    /// `question` is non-blank, and only it may carry the image.
    pub async fn append_exchange(
        &self,
        owner: &str,
        id: &str,
        question: Option<&str>,
        answer: &str,
        img: Option<&str>,
    ) -> Result<AppendAck, RepositoryError> {
        self.store
            .append_turns(id, owner, exchange_turns(question, answer, img))
            .await
    }
}

pub fn exchange_turns(question: Option<&str>, answer: &str, img: Option<&str>) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(2);
    if let Some(q) = question.filter(|q| !q.trim().is_empty()) {
        let img = img.filter(|i| !i.is_empty()).map(str::to_string);
        turns.push(Turn::user_with_image(q, img));
    }
    turns.push(Turn::model(answer));
    turns
}
