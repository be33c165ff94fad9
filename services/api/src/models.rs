//! API Models
//!
//! Request and response bodies of the host API, with `utoipa` schemas for the
//! generated OpenAPI document.

use serde::{Deserialize, Serialize};
use techbot_core::{Outbound, reply::SuggestedAction};
use utoipa::ToSchema;

/// A quick-reply button as rendered to the client.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct CardAction {
    #[schema(example = "Website Development")]
    pub title: String,
    /// Echoed back as the message text when the user picks this action.
    #[schema(example = "Website Development")]
    pub value: String,
}

impl From<&SuggestedAction> for CardAction {
    fn from(action: &SuggestedAction) -> Self {
        Self {
            title: action.title.clone(),
            value: action.value.clone(),
        }
    }
}

/// One outbound message from the bot.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct OutboundActivity {
    #[schema(example = "What would you like to explore?")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<CardAction>,
}

impl From<&Outbound> for OutboundActivity {
    fn from(message: &Outbound) -> Self {
        Self {
            text: message.text().to_string(),
            suggested_actions: message.options().iter().map(CardAction::from).collect(),
        }
    }
}

/// A channel member, as carried by member-added events.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ChannelAccount {
    #[schema(example = "user-42")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MessagePayload {
    #[schema(example = "user-42")]
    pub sender_id: String,
    #[schema(example = "techbot")]
    pub recipient_id: String,
    #[schema(example = "Website Development")]
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct MembersAddedPayload {
    pub members_added: Vec<ChannelAccount>,
    #[schema(example = "techbot")]
    pub recipient_id: String,
}

/// The messages produced for a single inbound event, in send order.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ActivitiesResponse {
    pub conversation_id: String,
    pub activities: Vec<OutboundActivity>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ConversationView {
    pub conversation_id: String,
    /// Key of the active topic, absent at the root menu.
    #[schema(example = "website development")]
    pub current_topic: Option<String>,
}

/// The root menu as offered to a newly greeted user.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct MenuResponse {
    #[schema(example = "Hi, I'm the Tech Resources Bot. I can help you explore different topics:")]
    pub welcome: String,
    #[schema(example = "What would you like to explore?")]
    pub prompt: String,
    pub options: Vec<CardAction>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
