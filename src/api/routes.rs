use axum::{
    extract::{FromRef, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use crate::{
    api::{
        docs::ApiDoc,
        dto::*,
        error::ApiError,
        rate_limiter::{rate_limit_middleware, RateLimiter},
    },
    auth::{AuthUser, TokenVerifier},
    config::Config,
    models::internal::{AppendAck, Conversation, UploadAuthParams, UserChats},
    services::{ChatService, UploadSigner},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chats: ChatService,
    pub verifier: Arc<TokenVerifier>,
    pub uploads: Option<Arc<UploadSigner>>,
    pub limiter: RateLimiter,
    pub started_at: Instant,
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

#[utoipa::path(
    post,
    path = "/api/chats",
    tag = "chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Id of the new conversation", body = String),
        (status = 400, description = "Blank text", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 500, description = "Error creating chat!")
    ),
    security(("bearer" = []))
)]
pub async fn create_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<String>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let conv = state
        .chats
        .create_chat(&user.user_id, &req.text)
        .await
        .map_err(|e| ApiError::from_repo("Error creating chat!", e))?;

    Ok((StatusCode::CREATED, Json(conv.id)))
}

#[utoipa::path(
    get,
    path = "/api/userchats",
    tag = "chats",
    responses(
        (status = 200, description = "The caller's chat index, possibly empty", body = [UserChats]),
        (status = 401, description = "Missing or invalid credential"),
        (status = 500, description = "Error fetching user chats!")
    ),
    security(("bearer" = []))
)]
pub async fn list_user_chats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<UserChats>>, ApiError> {
    let entries = state
        .chats
        .list_user_chats(&user.user_id)
        .await
        .map_err(|e| ApiError::from_repo("Error fetching user chats!", e))?;

    Ok(Json(entries))
}

/// Absent and foreign conversations both come back as `null`.
#[utoipa::path(
    get,
    path = "/api/chats/{id}",
    tag = "chats",
    params(("id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "The conversation, or null", body = Conversation),
        (status = 401, description = "Missing or invalid credential"),
        (status = 500, description = "Error fetching chat!")
    ),
    security(("bearer" = []))
)]
pub async fn get_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Option<Conversation>>, ApiError> {
    let conv = state
        .chats
        .get_chat(&user.user_id, &id)
        .await
        .map_err(|e| ApiError::from_repo("Error fetching chat!", e))?;

    Ok(Json(conv))
}

#[utoipa::path(
    put,
    path = "/api/chats/{id}",
    tag = "chats",
    params(("id" = String, Path, description = "Conversation id")),
    request_body = AppendExchangeRequest,
    responses(
        (status = 200, description = "Turns appended", body = AppendAck),
        (status = 400, description = "Invalid turns", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "No conversation for the caller", body = AppendAck),
        (status = 500, description = "Error adding conversation!")
    ),
    security(("bearer" = []))
)]
pub async fn append_exchange(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<AppendExchangeRequest>,
) -> Result<(StatusCode, Json<AppendAck>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let result = state
        .chats
        .append_exchange(
            &user.user_id,
            &id,
            req.question.as_deref(),
            &req.answer,
            req.img.as_deref(),
        )
        .await;

    match result {
        Ok(ack) => Ok((StatusCode::OK, Json(ack))),
        Err(e) if e.is_not_found() => Ok((StatusCode::NOT_FOUND, Json(AppendAck::unmatched()))),
        Err(e) => Err(ApiError::from_repo("Error adding conversation!", e)),
    }
}

#[utoipa::path(
    get,
    path = "/api/upload",
    tag = "uploads",
    responses(
        (status = 200, description = "Signed upload parameters", body = UploadAuthParams),
        (status = 401, description = "Missing or invalid credential"),
        (status = 503, description = "Uploads not configured", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn upload_auth(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<UploadAuthParams>, ApiError> {
    let signer = state
        .uploads
        .as_ref()
        .ok_or(ApiError::Unavailable("Image uploads are not configured"))?;

    Ok(Json(signer.authentication_parameters()))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

async fn api_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
            code: 404,
        }),
    )
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = config
        .client_url
        .as_deref()
        .and_then(|url| url.parse::<HeaderValue>().ok());

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/chats", post(create_chat))
        .route("/chats/{id}", get(get_chat).put(append_exchange))
        .route("/userchats", get(list_user_chats))
        .route("/upload", get(upload_auth))
        .fallback(api_not_found)
        .layer(middleware::from_fn_with_state(state.limiter.clone(), rate_limit_middleware));

    let mut app = Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));

    // Everything else is the single-page app shell
    if let Some(dir) = state.config.static_dir.as_ref() {
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}
