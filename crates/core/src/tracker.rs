//! Dialog Tracker
//!
//! Walks each conversation through the topic tree. A conversation remembers
//! exactly one thing: the key of the branch it is currently in, or nothing
//! when it is at the root menu.

use crate::reply::{FALLBACK_TEXT, Reply};
use crate::topic::{RESET_COMMAND, TopicNode, TopicTree, normalize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Per-conversation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Key of a branch reachable from the root, or `None` at the root menu.
    pub current_topic: Option<String>,
}

/// Owns the topic tree and the state of every conversation it has seen.
///
/// Each conversation sits behind its own lock, so at most one message per
/// conversation is processed at a time while different conversations run
/// independently. The outer map lock is only held to look up or insert.
pub struct DialogTracker {
    tree: TopicTree,
    conversations: Mutex<HashMap<String, Arc<Mutex<ConversationState>>>>,
}

impl DialogTracker {
    pub fn new(tree: TopicTree) -> Self {
        Self {
            tree,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    pub fn tree(&self) -> &TopicTree {
        &self.tree
    }

    /// Returns the state slot for a conversation, creating it at the root.
    async fn slot(&self, conversation_id: &str) -> Arc<Mutex<ConversationState>> {
        let mut conversations = self.conversations.lock().await;
        conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                debug!(conversation_id, "Tracking new conversation");
                Arc::new(Mutex::new(ConversationState::default()))
            })
            .clone()
    }

    /// Handles one inbound message and returns what the bot should send back.
    ///
    /// Unrecognized input never fails: it produces the fallback prompt with
    /// the options of the current level and leaves the state untouched.
    pub async fn handle_message(&self, conversation_id: &str, raw_text: &str) -> Reply {
        let slot = self.slot(conversation_id).await;
        let mut state = slot.lock().await;
        let text = normalize(raw_text);

        if text == RESET_COMMAND {
            info!(conversation_id, "Conversation reset");
            state.current_topic = None;
            return self.welcome_reply();
        }

        // A stale key (e.g. left over from a different tree) is treated as root.
        let current = state
            .current_topic
            .as_deref()
            .and_then(|key| self.tree.branch(key))
            .unwrap_or_else(|| self.tree.root());
        let (next, reply) = self.step(current, &text);
        state.current_topic = next;
        reply
    }

    /// Computes the transition from `node` for already-normalized `text`.
    ///
    /// Returns the key to remember next and the reply to send.
    fn step(&self, node: &TopicNode, text: &str) -> (Option<String>, Reply) {
        let at_root = node.key.is_empty();
        let stay = (!at_root).then(|| node.key.clone());

        match node.child(text) {
            Some(child) if child.is_leaf() => {
                info!(topic = %node.title, selection = %child.title, "Answered leaf selection");
                (None, Reply::new().text(&child.response))
            }
            Some(child) => {
                info!(topic = %child.title, "Entered topic");
                (Some(child.key.clone()), Reply::new().enter(child))
            }
            None => {
                debug!(input = %text, at_root, "Unrecognized input");
                (stay, Reply::new().menu(FALLBACK_TEXT, node))
            }
        }
    }

    /// The greeting followed by the root menu.
    fn welcome_reply(&self) -> Reply {
        let root = self.tree.root();
        Reply::new()
            .text(self.tree.welcome())
            .menu(root.prompt.clone().unwrap_or_default(), root)
    }

    /// Resets a conversation to the root and greets it.
    pub async fn welcome(&self, conversation_id: &str) -> Reply {
        let slot = self.slot(conversation_id).await;
        slot.lock().await.current_topic = None;
        self.welcome_reply()
    }

    /// Greets every added member except the bot itself.
    pub async fn members_added<S: AsRef<str>>(
        &self,
        conversation_id: &str,
        member_ids: &[S],
        recipient_id: &str,
    ) -> Reply {
        let mut reply = Reply::new();
        let greeted: Vec<&str> = member_ids
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|id| *id != recipient_id)
            .collect();
        if greeted.is_empty() {
            return reply;
        }

        // One turn for the whole event, however many members joined.
        let slot = self.slot(conversation_id).await;
        let mut state = slot.lock().await;
        for member_id in greeted {
            info!(conversation_id, member_id, "Member joined, sending welcome");
            state.current_topic = None;
            reply.extend(self.welcome_reply());
        }
        reply
    }

    /// The branch a conversation is currently in. Unknown conversations are
    /// reported as `None` without being created.
    pub async fn current_topic(&self, conversation_id: &str) -> Option<String> {
        let slot = self.conversations.lock().await.get(conversation_id).cloned()?;
        let state = slot.lock().await;
        state.current_topic.clone()
    }

    /// Whether a conversation has been seen before.
    pub async fn contains(&self, conversation_id: &str) -> bool {
        self.conversations.lock().await.contains_key(conversation_id)
    }

    pub async fn conversation_count(&self) -> usize {
        self.conversations.lock().await.len()
    }
}

impl Default for DialogTracker {
    fn default() -> Self {
        Self::new(TopicTree::default())
    }
}
