//! Reply rendering
//!
//! Turns topic nodes into outbound messages. Every option list the bot emits
//! goes through [`options_for`], which is what guarantees the trailing
//! "Start Over" entry.

use crate::Outbound;
use crate::topic::{TopicNode, normalize};
use serde::{Deserialize, Serialize};

/// Sent whenever input does not match any option at the current level.
pub const FALLBACK_TEXT: &str = "Please select one of the available options.";

/// Title and value of the reset option appended to every option list.
pub const START_OVER: &str = "Start Over";

/// A quick-reply option. `value` is echoed back verbatim as the next input
/// when the user picks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub value: String,
}

impl SuggestedAction {
    /// An option whose echoed value is its own title.
    pub fn im_back(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            value: title.clone(),
            title,
        }
    }
}

impl From<&TopicNode> for SuggestedAction {
    /// Echoes the title when it already matches the node's key, so the
    /// default menu sends back exactly what the user sees. A node with a
    /// custom key echoes the key instead.
    fn from(node: &TopicNode) -> Self {
        if normalize(&node.title) == node.key {
            Self::im_back(&node.title)
        } else {
            Self {
                title: node.title.clone(),
                value: node.key.clone(),
            }
        }
    }
}

/// Renders the children of `node` as options, followed by "Start Over".
pub fn options_for(node: &TopicNode) -> Vec<SuggestedAction> {
    node.children
        .iter()
        .map(SuggestedAction::from)
        .chain(std::iter::once(SuggestedAction::im_back(START_OVER)))
        .collect()
}

/// The ordered messages produced for one inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub messages: Vec<Outbound>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Outbound::Text { text: text.into() });
        self
    }

    /// Appends `text` offered together with the children of `node`.
    pub fn menu(mut self, text: impl Into<String>, node: &TopicNode) -> Self {
        self.messages.push(Outbound::TextWithOptions {
            text: text.into(),
            options: options_for(node),
        });
        self
    }

    /// Appends what a user sees when arriving at a branch: its intro, if it
    /// has one, then its prompt with its children as options.
    pub fn enter(self, node: &TopicNode) -> Self {
        let reply = match &node.intro {
            Some(intro) => self.text(intro),
            None => self,
        };
        let prompt = node.prompt.clone().unwrap_or_default();
        reply.menu(prompt, node)
    }

    pub fn extend(&mut self, other: Reply) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The options of the last message that carried any.
    pub fn options(&self) -> &[SuggestedAction] {
        self.messages
            .iter()
            .rev()
            .map(Outbound::options)
            .find(|o| !o.is_empty())
            .unwrap_or_default()
    }
}
