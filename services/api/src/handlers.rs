//! Axum Handlers for the REST API
//!
//! Each endpoint adapts one inbound channel event to the bot and answers with
//! the activities the bot sent, in order. It uses `utoipa` doc comments to
//! generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use techbot_core::{
    bot::{Activity, TopicBot},
    reply::options_for,
    transport::RecordingTransport,
};
use tracing::{error, info};

use crate::{
    models::{
        ActivitiesResponse, CardAction, ConversationView, ErrorResponse, MembersAddedPayload,
        MenuResponse, MessagePayload, OutboundActivity,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Runs one activity through the bot and collects what it sent.
async fn run_turn(
    state: &AppState,
    conversation_id: String,
    activity: Activity,
) -> Result<ActivitiesResponse, ApiError> {
    let transport = Arc::new(RecordingTransport::new());
    let bot = TopicBot::new(state.tracker.clone(), transport.clone());
    bot.on_turn(activity).await?;

    let activities = transport
        .drain()
        .await
        .iter()
        .map(|(_, message)| OutboundActivity::from(message))
        .collect();
    Ok(ActivitiesResponse {
        conversation_id,
        activities,
    })
}

/// Deliver a user message to the bot.
#[utoipa::path(
    post,
    path = "/conversations/{id}/messages",
    request_body = MessagePayload,
    responses(
        (status = 200, description = "Activities sent in reply", body = ActivitiesResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Conversation ID")
    )
)]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<MessagePayload>,
) -> Result<Json<ActivitiesResponse>, ApiError> {
    if payload.sender_id == payload.recipient_id {
        return Err(ApiError::BadRequest(
            "sender_id and recipient_id must differ".to_string(),
        ));
    }

    let activity = Activity::Message {
        conversation_id: id.clone(),
        sender_id: payload.sender_id,
        recipient_id: payload.recipient_id,
        text: payload.text,
    };
    let response = run_turn(&state, id, activity).await?;
    Ok(Json(response))
}

/// Notify the bot that members joined a conversation.
#[utoipa::path(
    post,
    path = "/conversations/{id}/members",
    request_body = MembersAddedPayload,
    responses(
        (status = 200, description = "Welcome activities, empty if only the bot joined", body = ActivitiesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Conversation ID")
    )
)]
pub async fn post_members_added(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<MembersAddedPayload>,
) -> Result<Json<ActivitiesResponse>, ApiError> {
    info!(
        conversation_id = %id,
        count = payload.members_added.len(),
        "Members added"
    );
    let activity = Activity::MembersAdded {
        conversation_id: id.clone(),
        member_ids: payload.members_added.into_iter().map(|m| m.id).collect(),
        recipient_id: payload.recipient_id,
    };
    let response = run_turn(&state, id, activity).await?;
    Ok(Json(response))
}

/// Get where a conversation currently is in the menu.
#[utoipa::path(
    get,
    path = "/conversations/{id}",
    responses(
        (status = 200, description = "Conversation state", body = ConversationView),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Conversation ID")
    )
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, ApiError> {
    if !state.tracker.contains(&id).await {
        return Err(ApiError::NotFound(format!(
            "Conversation with id '{}' not found",
            id
        )));
    }
    let current_topic = state.tracker.current_topic(&id).await;
    Ok(Json(ConversationView {
        conversation_id: id,
        current_topic,
    }))
}

/// Get the root menu.
#[utoipa::path(
    get,
    path = "/topics",
    responses(
        (status = 200, description = "The root menu", body = MenuResponse)
    )
)]
pub async fn get_topics(State(state): State<Arc<AppState>>) -> Json<MenuResponse> {
    let tree = state.tracker.tree();
    let root = tree.root();
    Json(MenuResponse {
        welcome: tree.welcome().to_string(),
        prompt: root.prompt.clone().unwrap_or_default(),
        options: options_for(root).iter().map(CardAction::from).collect(),
    })
}
