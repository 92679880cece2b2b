use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    AppendExchangeRequest, CreateChatRequest, ErrorResponse, HealthResponse,
};
use crate::models::internal::{
    AppendAck, ChatSummary, Conversation, Part, Role, Turn, UploadAuthParams, UserChats,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::routes::create_chat,
        crate::api::routes::list_user_chats,
        crate::api::routes::get_chat,
        crate::api::routes::append_exchange,
        crate::api::routes::upload_auth,
        crate::api::routes::health,
    ),
    components(schemas(
        CreateChatRequest,
        AppendExchangeRequest,
        AppendAck,
        Conversation,
        Turn,
        Part,
        Role,
        UserChats,
        ChatSummary,
        HealthResponse,
        ErrorResponse,
        UploadAuthParams,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "chats", description = "Conversation history and the per-user chat index"),
        (name = "uploads", description = "Credentials for direct image uploads"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
