//! Dialogue tree value types and parsing.
//!
//! A tree is caller-owned input. The engine only ever reads it, so a single
//! tree can back any number of preview sessions and layout passes at once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::choice::DialogueChoice;
use super::prerequisites::Prerequisites;

/// Raised only when the input is not a dialogue tree at all.
///
/// Incomplete authoring (dangling ids, missing start node, unknown
/// operators) is never an error; see `core::diagnostics`.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("malformed dialogue tree (JSON): {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed dialogue tree (RON): {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A speaking character and its portrait assets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default_emotion: String,
    /// Emotion name → asset reference.
    #[serde(default)]
    pub portraits: IndexMap<String, String>,
}

/// A gated override of a node's text and emotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Prerequisites>,
}

/// One line of dialogue and the choices that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueNode {
    #[serde(default)]
    pub id: String,
    /// Key into [`DialogueTree::characters`].
    #[serde(default)]
    pub character: String,
    /// Display name; may differ from the character's name.
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_texts: Option<Vec<AlternateText>>,
    #[serde(default)]
    pub choices: Vec<DialogueChoice>,
}

impl DialogueNode {
    pub fn new(id: impl Into<String>, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            character: String::new(),
            speaker: speaker.into(),
            text: text.into(),
            emotion: None,
            alternate_texts: None,
            choices: Vec::new(),
        }
    }

    pub fn with_character(mut self, character: impl Into<String>) -> Self {
        self.character = character.into();
        self
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    pub fn with_choice(mut self, choice: DialogueChoice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_alternate_text(mut self, alternate: AlternateText) -> Self {
        self.alternate_texts
            .get_or_insert_with(Vec::new)
            .push(alternate);
        self
    }

    pub fn alternate_texts(&self) -> &[AlternateText] {
        self.alternate_texts.as_deref().unwrap_or_default()
    }

    pub fn choice(&self, choice_id: &str) -> Option<&DialogueChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}

/// A complete branching conversation.
///
/// `characters` and `nodes` keep authored order, which is what makes
/// layout and lint output reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTree {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub characters: IndexMap<String, Character>,
    pub start_node_id: String,
    pub nodes: IndexMap<String, DialogueNode>,
}

impl DialogueTree {
    pub fn new(name: impl Into<String>, start_node_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            characters: IndexMap::new(),
            start_node_id: start_node_id.into(),
            nodes: IndexMap::new(),
        }
    }

    /// Parse a tree from its authored JSON form.
    pub fn from_json_str(input: &str) -> Result<DialogueTree, TreeError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Convert an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<DialogueTree, TreeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a tree from RON, using the same field names as the JSON form.
    pub fn from_ron_str(input: &str) -> Result<DialogueTree, TreeError> {
        Ok(ron::from_str(input)?)
    }

    /// Read a tree from disk; `.ron` files are parsed as RON, anything else as JSON.
    pub fn load_from_file(path: &Path) -> Result<DialogueTree, TreeError> {
        let contents = std::fs::read_to_string(path)?;
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            Self::from_ron_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_character(mut self, id: impl Into<String>, character: Character) -> Self {
        self.characters.insert(id.into(), character);
        self
    }

    /// Insert a node under its own id.
    pub fn with_node(mut self, node: DialogueNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        !id.is_empty() && self.nodes.contains_key(id)
    }

    pub fn start_node(&self) -> Option<&DialogueNode> {
        self.node(&self.start_node_id)
    }

    /// True when the start node exists, i.e. the tree can be previewed.
    pub fn is_playable(&self) -> bool {
        self.has_node(&self.start_node_id)
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Every choice in authored order, paired with the id of its node.
    pub fn choices(&self) -> impl Iterator<Item = (&str, &DialogueChoice)> {
        self.nodes
            .iter()
            .flat_map(|(id, node)| node.choices.iter().map(move |c| (id.as_str(), c)))
    }
}
