//! Defines the WebSocket message protocol between the chat client and the API server.

use crate::models::OutboundActivity;
use serde::{Deserialize, Serialize};

/// Messages sent from the client to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Joins a conversation. This must be the first message.
    #[serde(rename = "join")]
    Join {
        /// The conversation to join; a new one is created when absent.
        conversation_id: Option<String>,
        /// The id of the joining user.
        member_id: String,
    },
    /// Text typed by the user, or the value of a tapped suggested action.
    #[serde(rename = "user_message")]
    UserMessage { text: String },
}

/// Messages sent from the server to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the join and tells the client which conversation it is in.
    Joined { conversation_id: String },
    /// A message from the bot.
    Activity {
        conversation_id: String,
        #[serde(flatten)]
        activity: OutboundActivity,
    },
    /// Reports an error to the client.
    Error { message: String },
}
