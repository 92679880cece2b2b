// tests/integration/mod.rs

pub use serde_json::{json, Value};
pub use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use parley_server::{
    api::{
        rate_limiter::RateLimiter,
        routes::{create_router, AppState},
    },
    auth::TokenVerifier,
    config::Config,
    models::internal::Turn,
    services::{ChatService, UploadSigner},
    storage::{init_db, SeaOrmChatRepository},
    sync::{ModelError, ModelStream, TextStream},
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;
use tempfile::TempDir;
use tower::ServiceExt;

pub mod concurrency;
pub mod store;

// ============================================
// Shared Test Helpers
// ============================================

pub const TEST_SECRET: &str = "integration_secret_0123456789abcdef";
pub const TEST_UPLOAD_KEY: &str = "private_test_key";

pub fn create_test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: Some(TEST_SECRET.to_string()),
        imagekit_private_key: Some(TEST_UPLOAD_KEY.to_string()),
        ..Config::default()
    }
}

pub async fn create_test_repo() -> Arc<SeaOrmChatRepository> {
    let db = init_db("sqlite::memory:", 1)
        .await
        .expect("Failed to initialize in-memory database");
    Arc::new(SeaOrmChatRepository::new(db))
}

/// File-backed store with a real pool, so concurrent writers contend.
pub async fn create_file_repo(dir: &TempDir) -> Arc<SeaOrmChatRepository> {
    let url = format!("sqlite://{}", dir.path().join("parley.db").display());
    let db = init_db(&url, 8)
        .await
        .expect("Failed to initialize file database");
    Arc::new(SeaOrmChatRepository::new(db))
}

pub fn create_service(repo: Arc<SeaOrmChatRepository>) -> ChatService {
    ChatService::new(repo.clone(), repo, 40)
}

pub fn create_test_state(config: Config, repo: Arc<SeaOrmChatRepository>) -> AppState {
    let verifier = TokenVerifier::from_config(&config).expect("Test config has a JWT secret");
    let uploads = UploadSigner::from_config(&config).map(Arc::new);
    AppState {
        chats: ChatService::new(repo.clone(), repo, config.title_max_chars),
        limiter: RateLimiter::new(config.rate_limit_per_minute),
        config: Arc::new(config),
        verifier: Arc::new(verifier),
        uploads,
        started_at: Instant::now(),
    }
}

pub async fn create_test_app_with(config: Config) -> Router {
    let repo = create_test_repo().await;
    create_router(create_test_state(config, repo))
}

pub async fn create_test_app() -> Router {
    create_test_app_with(create_test_config()).await
}

pub fn token_for(user: &str) -> String {
    token_signed_with(user, TEST_SECRET)
}

pub fn token_signed_with(user: &str, secret: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    encode(
        &Header::default(),
        &json!({ "sub": user, "exp": exp }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Sends one request through the router. `user` adds a bearer token for
/// that user id.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("Authorization", format!("Bearer {}", token_for(user)));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

pub fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("Response body is not JSON")
}

// ============================================
// Model doubles
// ============================================

pub enum Reply {
    Chunks(Vec<&'static str>),
    Fail,
    /// Yields the chunks, then never finishes.
    Stall(Vec<&'static str>),
}

/// Plays back canned replies in order and records what it was asked.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    pub calls: Mutex<Vec<(Vec<Turn>, Turn)>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Vec<Turn>, Turn)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelStream for ScriptedModel {
    async fn stream(&self, context: &[Turn], prompt: &Turn) -> Result<TextStream, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((context.to_vec(), prompt.clone()));

        let reply = self.replies.lock().unwrap().pop_front();
        let owned = |chunks: Vec<&'static str>| {
            chunks
                .into_iter()
                .map(|c| Ok::<_, ModelError>(c.to_string()))
                .collect::<Vec<_>>()
        };

        match reply {
            Some(Reply::Chunks(chunks)) => Ok(futures::stream::iter(owned(chunks)).boxed()),
            Some(Reply::Stall(chunks)) => Ok(futures::stream::iter(owned(chunks))
                .chain(futures::stream::pending())
                .boxed()),
            Some(Reply::Fail) | None => Err(ModelError::Request("model unavailable".to_string())),
        }
    }
}
