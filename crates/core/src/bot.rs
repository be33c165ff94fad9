//! Activity handler
//!
//! Connects inbound channel events to the dialog tracker and pushes the
//! resulting messages out through a [`Transport`].

use crate::reply::Reply;
use crate::tracker::DialogTracker;
use crate::transport::{Transport, TransportError, dispatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

/// An inbound event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    /// A user sent text (typed, or the value of a tapped option).
    Message {
        conversation_id: String,
        sender_id: String,
        recipient_id: String,
        text: String,
    },
    /// Members joined the conversation. `recipient_id` is the bot's own id.
    MembersAdded {
        conversation_id: String,
        member_ids: Vec<String>,
        recipient_id: String,
    },
}

/// The menu bot: a tracker plus the transport its replies go out on.
pub struct TopicBot<T: Transport + ?Sized> {
    tracker: Arc<DialogTracker>,
    transport: Arc<T>,
}

impl<T: Transport + ?Sized> TopicBot<T> {
    pub fn new(tracker: Arc<DialogTracker>, transport: Arc<T>) -> Self {
        Self { tracker, transport }
    }

    pub fn tracker(&self) -> &Arc<DialogTracker> {
        &self.tracker
    }

    /// Routes an activity to the matching handler.
    pub async fn on_turn(&self, activity: Activity) -> Result<Reply, TransportError> {
        match activity {
            Activity::Message {
                conversation_id,
                text,
                ..
            } => self.on_message(&conversation_id, &text).await,
            Activity::MembersAdded {
                conversation_id,
                member_ids,
                recipient_id,
            } => {
                self.on_members_added(&conversation_id, &member_ids, &recipient_id)
                    .await
            }
        }
    }

    /// Handles a text message and delivers the reply.
    #[instrument(skip(self, text))]
    pub async fn on_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<Reply, TransportError> {
        let reply = self.tracker.handle_message(conversation_id, text).await;
        self.send(conversation_id, &reply).await?;
        Ok(reply)
    }

    /// Welcomes every added member other than the bot.
    #[instrument(skip(self))]
    pub async fn on_members_added(
        &self,
        conversation_id: &str,
        member_ids: &[String],
        recipient_id: &str,
    ) -> Result<Reply, TransportError> {
        let reply = self
            .tracker
            .members_added(conversation_id, member_ids, recipient_id)
            .await;
        self.send(conversation_id, &reply).await?;
        Ok(reply)
    }

    async fn send(&self, conversation_id: &str, reply: &Reply) -> Result<(), TransportError> {
        for message in &reply.messages {
            if let Err(e) = dispatch(self.transport.as_ref(), conversation_id, message).await {
                warn!(conversation_id, error = %e, "Failed to deliver reply");
                return Err(e);
            }
        }
        Ok(())
    }
}
