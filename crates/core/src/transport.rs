//! Outbound transport seam.
//!
//! The core never talks to a chat channel directly. A host plugs in a
//! `Transport` (a WebSocket, an HTTP response buffer, a channel adapter) and
//! the bot pushes every outbound message through it in order.

use crate::Outbound;
use crate::reply::SuggestedAction;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A failure reported by the host while delivering a message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Conversation '{0}' is no longer reachable")]
    Closed(String),
    #[error("Failed to deliver message: {0}")]
    Delivery(#[from] anyhow::Error),
}

/// Defines how outbound messages reach the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends plain text.
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<(), TransportError>;

    /// Sends text with quick-reply options. Picking an option makes the host
    /// deliver its `value` back as the next inbound message.
    async fn send_text_with_options(
        &self,
        conversation_id: &str,
        text: &str,
        options: &[SuggestedAction],
    ) -> Result<(), TransportError>;
}

/// Sends a single outbound message through `transport`.
pub async fn dispatch<T: Transport + ?Sized>(
    transport: &T,
    conversation_id: &str,
    message: &Outbound,
) -> Result<(), TransportError> {
    match message {
        Outbound::Text { text } => transport.send_text(conversation_id, text).await,
        Outbound::TextWithOptions { text, options } => {
            transport
                .send_text_with_options(conversation_id, text, options)
                .await
        }
    }
}

/// A `Transport` that keeps every sent message in memory.
///
/// Useful when the host answers a request with the whole batch at once, and
/// for tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, Outbound)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything sent so far, in order.
    pub async fn drain(&self) -> Vec<(String, Outbound)> {
        std::mem::take(&mut *self.sent.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sent.lock().await.is_empty()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<(), TransportError> {
        self.sent.lock().await.push((
            conversation_id.to_string(),
            Outbound::Text {
                text: text.to_string(),
            },
        ));
        Ok(())
    }

    async fn send_text_with_options(
        &self,
        conversation_id: &str,
        text: &str,
        options: &[SuggestedAction],
    ) -> Result<(), TransportError> {
        self.sent.lock().await.push((
            conversation_id.to_string(),
            Outbound::TextWithOptions {
                text: text.to_string(),
                options: options.to_vec(),
            },
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::START_OVER;

    #[tokio::test]
    async fn test_dispatch_routes_by_kind() {
        let transport = RecordingTransport::new();
        dispatch(
            &transport,
            "c1",
            &Outbound::Text {
                text: "hi".to_string(),
            },
        )
        .await
        .unwrap();
        dispatch(
            &transport,
            "c1",
            &Outbound::TextWithOptions {
                text: "pick".to_string(),
                options: vec![SuggestedAction::im_back(START_OVER)],
            },
        )
        .await
        .unwrap();

        let sent = transport.drain().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1.text(), "hi");
        assert_eq!(sent[1].1.options().len(), 1);
        assert!(transport.is_empty().await);
    }

    #[tokio::test]
    async fn test_dispatch_propagates_errors() {
        let mut mock = MockTransport::new();
        mock.expect_send_text()
            .returning(|id, _| Err(TransportError::Closed(id.to_string())));

        let err = dispatch(
            &mock,
            "gone",
            &Outbound::Text {
                text: "hi".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Conversation 'gone' is no longer reachable");
    }
}
