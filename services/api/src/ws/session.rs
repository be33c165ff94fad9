//! Manages the WebSocket connection lifecycle for a chat conversation.

use super::protocol::{ClientMessage, ServerMessage};
use crate::{models::OutboundActivity, state::AppState};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::sync::Arc;
use techbot_core::{
    Outbound,
    bot::TopicBot,
    reply::SuggestedAction,
    transport::{Transport, TransportError},
};
use tokio::sync::Mutex;
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

type SocketSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// A `Transport` that writes bot messages to the client socket.
struct SocketTransport {
    sink: SocketSink,
}

impl SocketTransport {
    async fn push(&self, conversation_id: &str, message: Outbound) -> Result<(), TransportError> {
        let msg = ServerMessage::Activity {
            conversation_id: conversation_id.to_string(),
            activity: OutboundActivity::from(&message),
        };
        send_msg(&mut *self.sink.lock().await, msg)
            .await
            .map_err(TransportError::Delivery)
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<(), TransportError> {
        self.push(
            conversation_id,
            Outbound::Text {
                text: text.to_string(),
            },
        )
        .await
    }

    async fn send_text_with_options(
        &self,
        conversation_id: &str,
        text: &str,
        options: &[SuggestedAction],
    ) -> Result<(), TransportError> {
        self.push(
            conversation_id,
            Outbound::TextWithOptions {
                text: text.to_string(),
                options: options.to_vec(),
            },
        )
        .await
    }
}

/// Main handler for an individual WebSocket connection.
///
/// Performs the `join` handshake, greets the member and then runs the chat
/// loop in its own instrumented task.
#[instrument(name = "ws_session", skip_all, fields(conversation_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("New WebSocket connection. Awaiting join...");

    let (socket_tx, mut socket_rx) = socket.split();
    let socket_tx: SocketSink = Arc::new(Mutex::new(socket_tx));

    let joined = match socket_rx.next().await {
        Some(Ok(Message::Text(text))) => parse_join(&text),
        Some(Ok(_)) => Err(anyhow!("First message was not a text `join` message.")),
        Some(Err(e)) => Err(anyhow!(e).context("Failed to read join message")),
        None => {
            info!("Client disconnected before sending join message.");
            return;
        }
    };

    let (conversation_id, member_id) = match joined {
        Ok(joined) => joined,
        Err(e) => {
            error!("Join failed: {:?}", e);
            let _ = send_msg(
                &mut *socket_tx.lock().await,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };
    tracing::Span::current().record("conversation_id", conversation_id.as_str());

    if send_msg(
        &mut *socket_tx.lock().await,
        ServerMessage::Joined {
            conversation_id: conversation_id.clone(),
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Joined message to client.");
        return;
    }

    let session_span = tracing::info_span!("chat", %conversation_id, %member_id);
    tokio::spawn(
        async move {
            if let Err(e) =
                run_chat_session(state, socket_tx, socket_rx, conversation_id, member_id).await
            {
                error!(error = ?e, "Chat session terminated with error.");
            }
            info!("Chat session finished.");
        }
        .instrument(session_span),
    );
}

/// Parses the `join` message, generating a conversation id when none is given.
fn parse_join(text: &str) -> Result<(String, String)> {
    let msg: ClientMessage = serde_json::from_str(text).context("Malformed join message")?;
    match msg {
        ClientMessage::Join {
            conversation_id,
            member_id,
        } => {
            if member_id.trim().is_empty() {
                return Err(anyhow!("`member_id` is required for `join`"));
            }
            let conversation_id = conversation_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            Ok((conversation_id, member_id))
        }
        _ => Err(anyhow!("First message must be `join`")),
    }
}

/// The main event loop for an active chat connection.
async fn run_chat_session(
    state: Arc<AppState>,
    socket_tx: SocketSink,
    mut socket_rx: SplitStream<WebSocket>,
    conversation_id: String,
    member_id: String,
) -> Result<()> {
    let transport = Arc::new(SocketTransport {
        sink: socket_tx.clone(),
    });
    let bot = TopicBot::new(state.tracker.clone(), transport);

    bot.on_members_added(&conversation_id, &[member_id], &state.config.bot_id)
        .await?;

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::UserMessage { text }) => {
                    bot.on_message(&conversation_id, &text).await?;
                }
                Ok(ClientMessage::Join { .. }) => {
                    warn!("Ignoring repeated join message.");
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed client message.");
                    send_msg(
                        &mut *socket_tx.lock().await,
                        ServerMessage::Error {
                            message: format!("Malformed message: {}", e),
                        },
                    )
                    .await?;
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client sent close frame. Shutting down session.");
                break;
            }
            Ok(Message::Binary(_)) => warn!("Ignoring binary message."),
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }

    info!("WebSocket connection closed.");
    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, router::create_router};
    use serde_json::{Value, json};
    use std::{net::SocketAddr, time::Duration};
    use techbot_core::{reply::FALLBACK_TEXT, tracker::DialogTracker};
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{
        MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
    };
    use tracing::Level;

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    const WELCOME: &str =
        "Hi, I'm the Tech Resources Bot. I can help you explore different topics:";

    /// Serves the full router on an ephemeral port.
    async fn spawn_server() -> (SocketAddr, Arc<DialogTracker>) {
        let tracker = Arc::new(DialogTracker::default());
        let state = Arc::new(AppState {
            tracker: tracker.clone(),
            config: Arc::new(Config {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                bot_id: "techbot".to_string(),
                log_level: Level::INFO,
                topics_path: None,
            }),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.unwrap();
        });
        (addr, tracker)
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        client
    }

    async fn send_json(client: &mut Client, value: Value) {
        client
            .send(WsMessage::text(value.to_string()))
            .await
            .unwrap();
    }

    /// Next text frame from the server, parsed as JSON.
    async fn recv_json(client: &mut Client) -> Value {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("timed out waiting for server message")
                .expect("socket closed")
                .unwrap();
            if let WsMessage::Text(text) = frame {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_session_welcomes_and_walks_menu() {
        let (addr, tracker) = spawn_server().await;
        let mut client = connect(addr).await;

        send_json(&mut client, json!({"type": "join", "conversation_id": "c1", "member_id": "u1"})).await;
        let joined = recv_json(&mut client).await;
        assert_eq!(joined, json!({"type": "joined", "conversation_id": "c1"}));

        let greeting = recv_json(&mut client).await;
        assert_eq!(greeting["type"], "activity");
        assert_eq!(greeting["conversation_id"], "c1");
        assert_eq!(greeting["text"], WELCOME);
        assert!(greeting.get("suggested_actions").is_none());

        let menu = recv_json(&mut client).await;
        assert_eq!(menu["text"], "What would you like to explore?");
        let actions = menu["suggested_actions"].as_array().unwrap();
        assert_eq!(actions.len(), 4);
        let website = actions[0]["value"].as_str().unwrap().to_string();

        send_json(&mut client, json!({"type": "user_message", "text": website})).await;
        let intro = recv_json(&mut client).await;
        assert_eq!(intro["text"], "Great choice! Let's explore Website Development.");
        let prompt = recv_json(&mut client).await;
        assert_eq!(prompt["suggested_actions"].as_array().unwrap().len(), 4);
        assert_eq!(
            tracker.current_topic("c1").await.as_deref(),
            Some("website development")
        );
    }

    #[tokio::test]
    async fn test_session_bot_join_is_silent() {
        let (addr, tracker) = spawn_server().await;
        let mut client = connect(addr).await;

        send_json(&mut client, json!({"type": "join", "conversation_id": "c2", "member_id": "techbot"})).await;
        assert_eq!(recv_json(&mut client).await["type"], "joined");

        // Had a welcome been sent, it would arrive before this reply.
        send_json(&mut client, json!({"type": "user_message", "text": "banana"})).await;
        let reply = recv_json(&mut client).await;
        assert_eq!(reply["text"], FALLBACK_TEXT);
        assert_eq!(reply["suggested_actions"].as_array().unwrap().len(), 4);
        assert!(tracker.contains("c2").await);
    }

    #[tokio::test]
    async fn test_session_reports_malformed_messages() {
        let (addr, _) = spawn_server().await;
        let mut client = connect(addr).await;

        send_json(&mut client, json!({"type": "join", "member_id": "techbot"})).await;
        let joined = recv_json(&mut client).await;
        assert!(Uuid::parse_str(joined["conversation_id"].as_str().unwrap()).is_ok());

        send_json(&mut client, json!({"type": "shout"})).await;
        let error = recv_json(&mut client).await;
        assert_eq!(error["type"], "error");
        assert!(error["message"].as_str().unwrap().starts_with("Malformed message"));

        send_json(&mut client, json!({"type": "user_message", "text": "start over"})).await;
        assert_eq!(recv_json(&mut client).await["text"], WELCOME);
    }

    #[tokio::test]
    async fn test_session_rejects_bad_join() {
        let (addr, _) = spawn_server().await;
        let mut client = connect(addr).await;

        send_json(&mut client, json!({"type": "user_message", "text": "hi"})).await;
        let error = recv_json(&mut client).await;
        assert_eq!(error["type"], "error");
        assert!(error["message"].as_str().unwrap().contains("must be `join`"));
    }

    #[test]
    fn test_parse_join_keeps_conversation_id() {
        let (conversation_id, member_id) =
            parse_join(r#"{"type": "join", "conversation_id": "c1", "member_id": "u1"}"#).unwrap();
        assert_eq!(conversation_id, "c1");
        assert_eq!(member_id, "u1");
    }

    #[test]
    fn test_parse_join_generates_conversation_id() {
        let (conversation_id, _) =
            parse_join(r#"{"type": "join", "conversation_id": " ", "member_id": "u1"}"#).unwrap();
        assert!(Uuid::parse_str(&conversation_id).is_ok());
    }

    #[test]
    fn test_parse_join_requires_member() {
        let err = parse_join(r#"{"type": "join", "member_id": ""}"#).unwrap_err();
        assert!(err.to_string().contains("member_id"));
    }

    #[test]
    fn test_parse_join_rejects_other_messages() {
        let err = parse_join(r#"{"type": "user_message", "text": "hi"}"#).unwrap_err();
        assert!(err.to_string().contains("must be `join`"));
    }
}
