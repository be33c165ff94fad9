pub mod bot;
pub mod reply;
pub mod topic;
pub mod tracker;
pub mod transport;

use reply::SuggestedAction;
use serde::{Deserialize, Serialize};

/// A single message the core asks the host to deliver.
///
/// This enum is the only output of the dialog logic; the host decides how a
/// message with options is rendered (quick-reply buttons, a list, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    /// Plain text with no follow-up actions.
    Text { text: String },
    /// Text offered together with quick-reply options.
    TextWithOptions {
        text: String,
        options: Vec<SuggestedAction>,
    },
}

impl Outbound {
    pub fn text(&self) -> &str {
        match self {
            Outbound::Text { text } | Outbound::TextWithOptions { text, .. } => text,
        }
    }

    /// The options attached to this message, empty for plain text.
    pub fn options(&self) -> &[SuggestedAction] {
        match self {
            Outbound::Text { .. } => &[],
            Outbound::TextWithOptions { options, .. } => options,
        }
    }
}
