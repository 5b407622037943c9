//! Prerequisite gates: required/blocked flags and numeric state comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison used by a [`StateCondition`].
///
/// Deserializes from any string. Text that is not one of `=`, `>`, `<`,
/// `>=`, `<=` is kept as `Unknown` and never satisfies a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComparisonOperator {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Unknown(String),
}

impl ComparisonOperator {
    /// The authored symbol for this operator.
    pub fn symbol(&self) -> &str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Unknown(raw) => raw,
        }
    }

    /// Apply the comparison `lhs <op> rhs`.
    pub fn compare(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Unknown(_) => false,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for ComparisonOperator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "=" => Self::Eq,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<ComparisonOperator> for String {
    fn from(op: ComparisonOperator) -> Self {
        match op {
            ComparisonOperator::Unknown(raw) => raw,
            known => known.symbol().to_string(),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `state[key] <operator> value`, with missing keys reading as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCondition {
    pub key: String,
    pub operator: ComparisonOperator,
    pub value: i64,
}

impl StateCondition {
    pub fn new(key: impl Into<String>, operator: ComparisonOperator, value: i64) -> Self {
        Self {
            key: key.into(),
            operator,
            value,
        }
    }
}

/// A gate combining flag membership and state comparisons.
///
/// Each list is optional so that "not authored" stays distinguishable
/// from "authored but empty"; both are treated the same by evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prerequisites {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_flags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_flags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_conditions: Option<Vec<StateCondition>>,
}

impl Prerequisites {
    pub fn required_flags(&self) -> &[String] {
        self.required_flags.as_deref().unwrap_or_default()
    }

    pub fn blocked_flags(&self) -> &[String] {
        self.blocked_flags.as_deref().unwrap_or_default()
    }

    pub fn state_conditions(&self) -> &[StateCondition] {
        self.state_conditions.as_deref().unwrap_or_default()
    }

    /// True when no gate of any kind is authored.
    pub fn is_empty(&self) -> bool {
        self.required_flags().is_empty()
            && self.blocked_flags().is_empty()
            && self.state_conditions().is_empty()
    }

    pub fn require(mut self, flag: impl Into<String>) -> Self {
        self.required_flags
            .get_or_insert_with(Vec::new)
            .push(flag.into());
        self
    }

    pub fn block(mut self, flag: impl Into<String>) -> Self {
        self.blocked_flags
            .get_or_insert_with(Vec::new)
            .push(flag.into());
        self
    }

    pub fn when(mut self, condition: StateCondition) -> Self {
        self.state_conditions
            .get_or_insert_with(Vec::new)
            .push(condition);
        self
    }
}
