use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use crate::api::dto::AppendExchangeRequest;
use crate::models::internal::{AppendAck, Conversation, UserChats};
use crate::services::ChatService;
use crate::sync::SyncError;

/// The chat backend as seen by one signed-in client.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Creates a conversation seeded with `text`; returns its id.
    async fn create_chat(&self, text: &str) -> Result<String, SyncError>;

    /// `None` for absent conversations and for other users' conversations.
    async fn fetch_chat(&self, id: &str) -> Result<Option<Conversation>, SyncError>;

    /// Pushes one completed round. A non-matching id is [`SyncError::NotFound`].
    async fn append(
        &self,
        id: &str,
        question: Option<&str>,
        answer: &str,
        img: Option<&str>,
    ) -> Result<AppendAck, SyncError>;

    async fn list_chats(&self) -> Result<Vec<UserChats>, SyncError>;
}

/// Talks to a running server over its JSON API.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(SyncError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn create_chat(&self, text: &str) -> Result<String, SyncError> {
        let response = self
            .client
            .post(self.url("/api/chats"))
            .bearer_auth(&self.token)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_chat(&self, id: &str) -> Result<Option<Conversation>, SyncError> {
        let response = self
            .client
            .get(self.url(&format!("/api/chats/{}", id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn append(
        &self,
        id: &str,
        question: Option<&str>,
        answer: &str,
        img: Option<&str>,
    ) -> Result<AppendAck, SyncError> {
        let body = AppendExchangeRequest {
            question: question.map(str::to_string),
            answer: answer.to_string(),
            img: img.map(str::to_string),
        };

        let response = self
            .client
            .put(self.url(&format!("/api/chats/{}", id)))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(id.to_string()));
        }

        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_chats(&self) -> Result<Vec<UserChats>, SyncError> {
        let response = self
            .client
            .get(self.url("/api/userchats"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

/// In-process backend bound to one user, for embedding the store
/// without the HTTP layer.
#[derive(Clone)]
pub struct LocalChatBackend {
    service: ChatService,
    owner: String,
}

impl LocalChatBackend {
    pub fn new(service: ChatService, owner: impl Into<String>) -> Self {
        Self {
            service,
            owner: owner.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for LocalChatBackend {
    async fn create_chat(&self, text: &str) -> Result<String, SyncError> {
        let conv = self.service.create_chat(&self.owner, text).await?;
        Ok(conv.id)
    }

    async fn fetch_chat(&self, id: &str) -> Result<Option<Conversation>, SyncError> {
        Ok(self.service.get_chat(&self.owner, id).await?)
    }

    async fn append(
        &self,
        id: &str,
        question: Option<&str>,
        answer: &str,
        img: Option<&str>,
    ) -> Result<AppendAck, SyncError> {
        Ok(self
            .service
            .append_exchange(&self.owner, id, question, answer, img)
            .await?)
    }

    async fn list_chats(&self) -> Result<Vec<UserChats>, SyncError> {
        Ok(self.service.list_user_chats(&self.owner).await?)
    }
}
