//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, WebSocket endpoint, and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ActivitiesResponse, CardAction, ChannelAccount, ConversationView, ErrorResponse,
        MembersAddedPayload, MenuResponse, MessagePayload, OutboundActivity,
    },
    state::AppState,
    ws::ws_handler,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::post_message,
        handlers::post_members_added,
        handlers::get_conversation,
        handlers::get_topics,
    ),
    components(
        schemas(MessagePayload, MembersAddedPayload, ChannelAccount, ActivitiesResponse, OutboundActivity, CardAction, ConversationView, MenuResponse, ErrorResponse)
    ),
    tags(
        (name = "Tech Resources Bot API", description = "Channel events for the Tech Resources menu bot")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/topics", get(handlers::get_topics))
        .route("/conversations/{id}", get(handlers::get_conversation))
        .route(
            "/conversations/{id}/messages",
            post(handlers::post_message),
        )
        .route(
            "/conversations/{id}/members",
            post(handlers::post_members_added),
        )
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
