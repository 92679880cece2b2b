use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// ==================== REQUEST DTOs ====================

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateChatRequest {
    /// Opening user message; also the source of the chat title
    #[validate(length(min = 1, max = 100000))]
    pub text: String,
}

/// One completed round: the user's question (absent for the opening
/// round, whose question is already stored) and the model's answer.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct AppendExchangeRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[validate(length(max = 1000000))]
    pub answer: String,
    /// CDN path of an image attached to the question
    #[serde(default)]
    pub img: Option<String>,
}

// ==================== RESPONSE DTOs ====================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u32,
}
