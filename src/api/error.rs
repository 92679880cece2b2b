use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::dto::ErrorResponse;
use crate::storage::RepositoryError;

/// Errors surfaced at the route boundary.
///
/// Causes are logged here and never sent to the client; each persistence
/// failure carries the generic message of the route that hit it.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error("Unavailable: {0}")]
    Unavailable(&'static str),
}

impl ApiError {
    /// Maps a repository failure, keeping caller mistakes as 400s.
    pub fn from_repo(context: &'static str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidInput(msg) => Self::InvalidInput(msg),
            source => Self::Persistence { context, source },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "Unauthenticated!").into_response()
            }
            ApiError::InvalidInput(error) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error, code: 400 }),
            )
                .into_response(),
            ApiError::Persistence { context, source } => {
                tracing::error!(error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, context).into_response()
            }
            ApiError::Unavailable(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: what.to_string(),
                    code: 503,
                }),
            )
                .into_response(),
        }
    }
}
