//! Topic Tree
//!
//! The menu the bot walks a user through. Every node is addressed by a
//! normalized key, so matching user input is a plain string comparison.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The command that returns any conversation to the root menu.
pub const RESET_COMMAND: &str = "start over";

/// Errors raised while building or loading a topic catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Topic title must not be empty")]
    EmptyTitle,
    #[error("Duplicate topic key: '{0}'")]
    DuplicateKey(String),
    #[error("Topic '{0}' collides with the reset command")]
    ReservedKey(String),
    #[error("Topic '{0}' has children but no prompt")]
    MissingPrompt(String),
    #[error("Topic '{0}' is a leaf but has no response text")]
    MissingResponse(String),
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Trims and lowercases text so that it can be compared against node keys.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A single entry of the menu.
///
/// A node without children is a leaf: selecting it yields `response` and ends
/// the current walk. A node with children is a branch: entering it sends the
/// optional `intro`, then `prompt` together with its children as options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    /// Normalized lookup key. Derived from `title` when left empty.
    #[serde(default)]
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TopicNode>,
}

impl TopicNode {
    /// Creates a terminal entry.
    pub fn leaf(title: impl Into<String>, response: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            key: normalize(&title),
            title,
            intro: None,
            prompt: None,
            response: response.into(),
            children: Vec::new(),
        }
    }

    /// Creates an entry that opens a sub-menu.
    pub fn branch(
        title: impl Into<String>,
        intro: impl Into<String>,
        prompt: impl Into<String>,
        children: Vec<TopicNode>,
    ) -> Self {
        let title = title.into();
        Self {
            key: normalize(&title),
            title,
            intro: Some(intro.into()),
            prompt: Some(prompt.into()),
            response: String::new(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Finds the direct child whose key equals already-normalized `text`.
    pub fn child(&self, text: &str) -> Option<&TopicNode> {
        self.children.iter().find(|c| c.key == text)
    }

    /// Depth-first search for a node by key, including `self`.
    fn find(&self, key: &str) -> Option<&TopicNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(key))
    }

    fn normalize_keys(&mut self) {
        self.key = if self.key.trim().is_empty() {
            normalize(&self.title)
        } else {
            normalize(&self.key)
        };
        for child in &mut self.children {
            child.normalize_keys();
        }
    }

    fn validate(&self, seen: &mut HashSet<String>) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() || self.key.is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        if self.key == RESET_COMMAND || normalize(&self.title) == RESET_COMMAND {
            return Err(CatalogError::ReservedKey(self.title.clone()));
        }
        if !seen.insert(self.key.clone()) {
            return Err(CatalogError::DuplicateKey(self.key.clone()));
        }
        if self.is_leaf() {
            if self.response.trim().is_empty() {
                return Err(CatalogError::MissingResponse(self.title.clone()));
            }
        } else if self.prompt.as_deref().is_none_or(|p| p.trim().is_empty()) {
            return Err(CatalogError::MissingPrompt(self.title.clone()));
        }
        self.children.iter().try_for_each(|c| c.validate(seen))
    }
}

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub welcome: String,
    pub menu_prompt: String,
    pub topics: Vec<TopicNode>,
}

/// A validated menu, ready to be walked by the dialog tracker.
#[derive(Debug, Clone)]
pub struct TopicTree {
    welcome: String,
    root: TopicNode,
}

impl TopicTree {
    /// Builds a tree from a catalog, normalizing every key.
    ///
    /// Keys must be unique across the whole tree because a conversation
    /// remembers its position by key alone.
    pub fn new(catalog: Catalog) -> Result<Self, CatalogError> {
        let mut topics = catalog.topics;
        for topic in &mut topics {
            topic.normalize_keys();
        }
        let mut seen = HashSet::new();
        for topic in &topics {
            topic.validate(&mut seen)?;
        }

        Ok(Self {
            welcome: catalog.welcome,
            root: TopicNode {
                key: String::new(),
                title: String::new(),
                intro: None,
                prompt: Some(catalog.menu_prompt),
                response: String::new(),
                children: topics,
            },
        })
    }

    /// Parses and validates a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        Self::new(catalog)
    }

    /// Reads a JSON catalog from disk.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    pub fn root(&self) -> &TopicNode {
        &self.root
    }

    /// Looks up a branch by key. Leaves and unknown keys yield `None`.
    pub fn branch(&self, key: &str) -> Option<&TopicNode> {
        self.root
            .children
            .iter()
            .find_map(|c| c.find(key))
            .filter(|n| !n.is_leaf())
    }
}

impl Default for TopicTree {
    fn default() -> Self {
        Self::new(default_catalog()).expect("built-in catalog is valid")
    }
}

/// The Tech Resources menu.
pub fn default_catalog() -> Catalog {
    Catalog {
        welcome: "Hi, I'm the Tech Resources Bot. I can help you explore different topics:"
            .to_string(),
        menu_prompt: "What would you like to explore?".to_string(),
        topics: vec![
            TopicNode::branch(
                "Website Development",
                "Great choice! Let's explore Website Development.",
                "What aspect of Website Development are you interested in?",
                vec![
                    TopicNode::leaf(
                        "Frontend Development",
                        "Frontend Development involves creating the user interface and user experience of a website. It includes HTML, CSS, and JavaScript.",
                    ),
                    TopicNode::leaf(
                        "Backend Development",
                        "Backend Development involves server-side programming and database management to make websites functional.",
                    ),
                    TopicNode::leaf(
                        "UI/UX",
                        "UI/UX stands for User Interface (UI) and User Experience (UX) design, focusing on making websites user-friendly and visually appealing.",
                    ),
                ],
            ),
            TopicNode::branch(
                "Mobile App Development",
                "Sure! Let's dive into Mobile App Development.",
                "What aspect of Mobile App Development are you interested in?",
                vec![
                    TopicNode::leaf(
                        "Android App Development",
                        "Android App Development involves creating mobile applications specifically for Android devices using Java or Kotlin.",
                    ),
                    TopicNode::leaf(
                        "iOS App Development",
                        "iOS App Development focuses on creating mobile applications for Apple's iOS devices using Swift or Objective-C.",
                    ),
                ],
            ),
            TopicNode::branch(
                "Competitive Programming",
                "Excellent! Let's get started with Competitive Programming.",
                "What aspect of Competitive Programming are you interested in?",
                vec![
                    TopicNode::leaf(
                        "Algorithm Challenges",
                        "Algorithm Challenges involve solving complex coding problems and optimizing algorithms.",
                    ),
                    TopicNode::leaf(
                        "Online Coding Platforms",
                        "Online Coding Platforms provide a platform for practicing coding challenges and participating in coding competitions.",
                    ),
                ],
            ),
        ],
    }
}
