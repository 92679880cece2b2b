use futures::StreamExt;

use crate::models::internal::Turn;
use crate::sync::model::{replay_context, ModelStream};
use crate::sync::{ChatBackend, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No conversation yet.
    Draft,
    /// Conversation stored with its opening turn, not yet answered.
    Created,
    /// Model output is arriving; nothing of this round is stored.
    Streaming,
    /// The round is being pushed to the backend; it may or may not have
    /// been stored.
    Appending,
    /// Last round persisted; ready for the next question.
    Appended,
}

/// One client's view of one conversation.
///
/// Every operation takes `&mut self` and runs to completion before the next
/// can start, which is what keeps rounds in the order the user issued them.
pub struct ChatSession<B, M> {
    backend: B,
    model: M,
    chat_id: Option<String>,
    history: Vec<Turn>,
    state: SessionState,
    settled: SessionState,
}

impl<B: ChatBackend, M: ModelStream> ChatSession<B, M> {
    pub fn new(backend: B, model: M) -> Self {
        Self {
            backend,
            model,
            chat_id: None,
            history: Vec::new(),
            state: SessionState::Draft,
            settled: SessionState::Draft,
        }
    }

    /// Picks up an existing conversation. One stored turn means the
    /// opening question was never answered.
    pub async fn resume(backend: B, model: M, id: &str) -> Result<Self, SyncError> {
        let mut session = Self::new(backend, model);
        session.reload(id).await?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// Turns known to be persisted, in order.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates the conversation from its opening message.
    pub async fn start(&mut self, text: &str) -> Result<String, SyncError> {
        self.recover().await?;
        if self.state != SessionState::Draft {
            return Err(SyncError::InvalidState(self.state));
        }

        let id = self.backend.create_chat(text).await?;
        tracing::debug!(chat_id = %id, "Conversation created");

        self.chat_id = Some(id.clone());
        self.history = vec![Turn::user(text)];
        self.settle(SessionState::Created);
        Ok(id)
    }

    /// Answers the stored opening turn. Only the model turn is appended,
    /// since the question is already part of the history.
    pub async fn respond<F>(&mut self, on_chunk: F) -> Result<String, SyncError>
    where
        F: FnMut(&str) + Send,
    {
        self.recover().await?;
        if self.state != SessionState::Created {
            return Err(SyncError::InvalidState(self.state));
        }

        let Some((prompt, context)) = self.history.split_last() else {
            return Err(SyncError::InvalidState(self.state));
        };
        let (prompt, context) = (prompt.clone(), context.to_vec());
        self.run_round(context, prompt, false, on_chunk).await
    }

    /// Asks a follow-up question and appends the question/answer pair.
    pub async fn ask<F>(
        &mut self,
        text: &str,
        img: Option<&str>,
        on_chunk: F,
    ) -> Result<String, SyncError>
    where
        F: FnMut(&str) + Send,
    {
        self.recover().await?;
        if self.state != SessionState::Appended {
            return Err(SyncError::InvalidState(self.state));
        }

        let prompt = Turn::user_with_image(text, img.map(str::to_string));
        let context = self.history.clone();
        self.run_round(context, prompt, true, on_chunk).await
    }

    async fn run_round<F>(
        &mut self,
        context: Vec<Turn>,
        prompt: Turn,
        persist_prompt: bool,
        mut on_chunk: F,
    ) -> Result<String, SyncError>
    where
        F: FnMut(&str) + Send,
    {
        let id = self
            .chat_id
            .clone()
            .ok_or(SyncError::InvalidState(self.state))?;

        self.state = SessionState::Streaming;

        let answer = match self.stream_answer(&context, &prompt, &mut on_chunk).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(chat_id = %id, "Model stream failed: {}", e);
                self.state = self.settled;
                return Err(e);
            }
        };

        let (question, img) = if persist_prompt {
            (Some(prompt.first_text()), prompt.img.as_deref())
        } else {
            (None, None)
        };

        self.state = SessionState::Appending;
        if let Err(e) = self.backend.append(&id, question, &answer, img).await {
            tracing::warn!(chat_id = %id, "Append failed: {}", e);
            // A transport error may hide a committed append; stay in
            // Appending so the next call re-reads the stored history.
            if !matches!(e, SyncError::Http(_)) {
                self.state = self.settled;
            }
            return Err(e);
        }

        if persist_prompt {
            self.history.push(prompt);
        }
        self.history.push(Turn::model(answer.clone()));
        self.settle(SessionState::Appended);
        Ok(answer)
    }

    /// Accumulates the whole answer, handing each chunk to `on_chunk`.
    async fn stream_answer<F>(
        &self,
        context: &[Turn],
        prompt: &Turn,
        on_chunk: &mut F,
    ) -> Result<String, SyncError>
    where
        F: FnMut(&str) + Send,
    {
        let replay = replay_context(context);
        let mut stream = self.model.stream(&replay, prompt).await?;

        let mut answer = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            on_chunk(&chunk);
            answer.push_str(&chunk);
        }
        Ok(answer)
    }

    fn settle(&mut self, state: SessionState) {
        self.state = state;
        self.settled = state;
    }

    /// Replaces local history with the stored conversation. One stored
    /// turn means the opening question was never answered.
    async fn reload(&mut self, id: &str) -> Result<(), SyncError> {
        let conv = self
            .backend
            .fetch_chat(id)
            .await?
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;

        let state = if conv.history.len() == 1 {
            SessionState::Created
        } else {
            SessionState::Appended
        };

        self.chat_id = Some(conv.id);
        self.history = conv.history;
        self.settle(state);
        Ok(())
    }

    /// Cleans up after a round that did not finish.
    ///
    /// `Streaming` means nothing was stored, so the last settled state
    /// stands. `Appending` means the backend may already hold the round,
    /// so the stored conversation is authoritative.
    async fn recover(&mut self) -> Result<(), SyncError> {
        match self.state {
            SessionState::Streaming => {
                tracing::debug!(chat_id = ?self.chat_id, "Discarding abandoned round");
                self.state = self.settled;
            }
            SessionState::Appending => {
                let Some(id) = self.chat_id.clone() else {
                    self.state = self.settled;
                    return Ok(());
                };
                tracing::debug!(chat_id = %id, "Re-reading history after unconfirmed append");
                self.reload(&id).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
