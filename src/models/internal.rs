use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Author of a turn. Closed set: the store rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "model" => Ok(Role::Model),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One entry of a conversation log.
///
/// `img` is a CDN file path and only ever set on user turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
            img: None,
        }
    }

    pub fn user_with_image(text: impl Into<String>, img: Option<String>) -> Self {
        Self {
            img,
            ..Self::user(text)
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
            img: None,
        }
    }

    /// Text of the first part, which is what gets replayed to the model.
    pub fn first_text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or_default()
    }

    /// Checks the turn-level invariants before it is persisted.
    pub fn check(&self) -> Result<(), String> {
        if self.parts.is_empty() {
            return Err(format!("{} turn has no parts", self.role));
        }
        if self.role == Role::Model && self.img.is_some() {
            return Err("model turns cannot carry an image".to_string());
        }
        Ok(())
    }
}

/// A persisted conversation, serialized in the document shape clients
/// already consume (`_id`, `userId`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl ChatSummary {
    /// Summary for a freshly created conversation; the title is the
    /// first `max_chars` characters of its opening text.
    pub fn for_conversation(conv: &Conversation, max_chars: usize) -> Self {
        let opening = conv.history.first().map(Turn::first_text).unwrap_or_default();
        Self {
            id: conv.id.clone(),
            title: derive_title(opening, max_chars),
            created_at: conv.created_at,
        }
    }
}

/// Per-user index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserChats {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub chats: Vec<ChatSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of an append, in the shape of a document-store update result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppendAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl AppendAck {
    pub fn applied() -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: 1,
        }
    }

    /// Acknowledgement for an append whose (id, owner) matched nothing.
    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
        }
    }
}

/// Parameters a browser needs to upload straight to the image CDN. The
/// public key and endpoint are echoed from configuration when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadAuthParams {
    pub token: String,
    pub expire: i64,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_endpoint: Option<String>,
}

pub fn derive_title(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
