//! Player choices and the effects they carry.

use serde::{Deserialize, Serialize};

use super::prerequisites::Prerequisites;

/// How a [`StateChange`] combines with the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StateOperation {
    Add,
    Subtract,
    /// Also used for any unrecognized operation name.
    #[default]
    Set,
}

impl StateOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Set => "set",
        }
    }

    /// Combine `current` with `value`, saturating at the `i64` bounds.
    pub fn apply(&self, current: i64, value: i64) -> i64 {
        match self {
            Self::Add => current.saturating_add(value),
            Self::Subtract => current.saturating_sub(value),
            Self::Set => value,
        }
    }
}

impl From<String> for StateOperation {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            _ => Self::Set,
        }
    }
}

impl From<StateOperation> for String {
    fn from(op: StateOperation) -> Self {
        op.name().to_string()
    }
}

/// Adjustment of one state counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub key: String,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<StateOperation>,
}

impl StateChange {
    pub fn new(key: impl Into<String>, value: i64, operation: StateOperation) -> Self {
        Self {
            key: key.into(),
            value,
            operation: Some(operation),
        }
    }

    /// The authored operation, or `Set` when none was given.
    pub fn operation(&self) -> StateOperation {
        self.operation.unwrap_or_default()
    }
}

/// Flags to add and remove when a choice is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<Vec<String>>,
}

impl FlagChanges {
    pub fn added(&self) -> &[String] {
        self.add.as_deref().unwrap_or_default()
    }

    pub fn removed(&self) -> &[String] {
        self.remove.as_deref().unwrap_or_default()
    }
}

/// A gated override of a choice's destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternateDestination {
    pub next_node_id: String,
    #[serde(default)]
    pub prerequisites: Prerequisites,
}

/// Terminal marker: taking the choice ends the conversation with `status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChoiceExit {
    pub status: String,
}

/// An option offered to the player at a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueChoice {
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// May be empty or reference a missing node while a tree is being edited.
    #[serde(default)]
    pub next_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Prerequisites>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_changes: Option<FlagChanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_changes: Option<Vec<StateChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_destinations: Option<Vec<AlternateDestination>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<ChoiceExit>,
}

impl DialogueChoice {
    pub fn new(id: impl Into<String>, text: impl Into<String>, next_node_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            next_node_id: next_node_id.into(),
            prerequisites: None,
            flag_changes: None,
            state_changes: None,
            alternate_destinations: None,
            exit: None,
        }
    }

    /// A choice that ends the conversation with `status`.
    pub fn exit(id: impl Into<String>, text: impl Into<String>, status: impl Into<String>) -> Self {
        let mut choice = Self::new(id, text, "");
        choice.exit = Some(ChoiceExit {
            status: status.into(),
        });
        choice
    }

    pub fn with_prerequisites(mut self, prerequisites: Prerequisites) -> Self {
        self.prerequisites = Some(prerequisites);
        self
    }

    pub fn with_flag_changes(mut self, add: &[&str], remove: &[&str]) -> Self {
        let to_vec = |flags: &[&str]| flags.iter().map(|f| f.to_string()).collect::<Vec<_>>();
        self.flag_changes = Some(FlagChanges {
            add: Some(to_vec(add)),
            remove: Some(to_vec(remove)),
        });
        self
    }

    pub fn with_state_change(mut self, change: StateChange) -> Self {
        self.state_changes.get_or_insert_with(Vec::new).push(change);
        self
    }

    pub fn with_alternate_destination(
        mut self,
        next_node_id: impl Into<String>,
        prerequisites: Prerequisites,
    ) -> Self {
        self.alternate_destinations
            .get_or_insert_with(Vec::new)
            .push(AlternateDestination {
                next_node_id: next_node_id.into(),
                prerequisites,
            });
        self
    }

    pub fn state_changes(&self) -> &[StateChange] {
        self.state_changes.as_deref().unwrap_or_default()
    }

    pub fn alternate_destinations(&self) -> &[AlternateDestination] {
        self.alternate_destinations.as_deref().unwrap_or_default()
    }

    pub fn exit_status(&self) -> Option<&str> {
        self.exit.as_ref().map(|e| e.status.as_str())
    }
}
