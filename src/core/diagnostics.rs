//! Authoring diagnostics: dangling choices, tooltips and a whole-tree lint.
//!
//! Nothing here fails. Incomplete trees are normal while editing, so every
//! finding is data the editor can show next to the node.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::core::layout::{exit_node_id, reachable_node_ids};
use crate::core::variables::extract_variables;
use crate::schema::choice::DialogueChoice;
use crate::schema::prerequisites::Prerequisites;
use crate::schema::state::FlagSet;
use crate::schema::tree::DialogueTree;

/// True when the choice is not an exit and its `nextNodeId` is empty or
/// names no node.
pub fn is_dangling(choice: &DialogueChoice, tree: &DialogueTree) -> bool {
    choice.exit.is_none() && !tree.has_node(&choice.next_node_id)
}

/// Graph-view tooltip for a choice. First applicable line wins: exit status,
/// missing target, required/blocked summary, blockable summary.
pub fn choice_tooltip(choice: &DialogueChoice, tree: &DialogueTree) -> Option<String> {
    if let Some(status) = choice.exit_status() {
        return Some(format!("Exit: {}", status));
    }
    if is_dangling(choice, tree) {
        return Some("Missing target node!".to_string());
    }

    let p = choice.prerequisites.as_ref()?;
    if !p.required_flags().is_empty() || !p.state_conditions().is_empty() {
        let mut text = format!("Required: {}", p.required_flags().join(", "));
        if !p.blocked_flags().is_empty() {
            text.push_str(&format!("\nBlocked by: {}", p.blocked_flags().join(", ")));
        }
        return Some(text);
    }
    if !p.blocked_flags().is_empty() {
        return Some(format!("Can be blocked by: {}", p.blocked_flags().join(", ")));
    }
    None
}

/// Why a choice is unavailable under `flags`, one reason per line.
/// `None` when there is nothing to report.
pub fn locked_reason(choice: &DialogueChoice, flags: &FlagSet) -> Option<String> {
    let p = choice.prerequisites.as_ref()?;
    let mut reasons = Vec::new();

    if p.required_flags().iter().any(|f| !flags.contains(f)) {
        reasons.push(format!("Required flags: {}", p.required_flags().join(", ")));
    }
    if p.blocked_flags().iter().any(|f| flags.contains(f)) {
        reasons.push(format!("Blocked by flags: {}", p.blocked_flags().join(", ")));
    }
    if !p.state_conditions().is_empty() {
        reasons.push("State conditions not met".to_string());
    }

    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("\n"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    MissingStartNode,
    NodeIdMismatch,
    DanglingChoice,
    DanglingAlternateDestination,
    UnreachableNode,
    UnknownCharacter,
    MissingDefaultPortrait,
    UnknownOperator,
    UnwrittenVariable,
    ExitIdCollision,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingStartNode | Self::NodeIdMismatch => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub node_id: Option<String>,
    pub choice_id: Option<String>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub issues: Vec<Issue>,
}

impl LintReport {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn of_kind<'a>(&'a self, kind: &'a IssueKind) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |i| &i.kind == kind)
    }

    fn push(&mut self, kind: IssueKind, node_id: Option<&str>, choice_id: Option<&str>, message: String) {
        self.issues.push(Issue {
            severity: kind.severity(),
            kind,
            node_id: node_id.map(str::to_string),
            choice_id: choice_id.map(str::to_string),
            message,
        });
    }
}

/// Check a whole tree. Issues come out tree-level first, then node by node
/// in authored order, then variables.
pub fn lint(tree: &DialogueTree) -> LintReport {
    let mut report = LintReport::default();

    if !tree.is_playable() {
        report.push(
            IssueKind::MissingStartNode,
            None,
            None,
            format!("Start node '{}' does not exist", tree.start_node_id),
        );
    }

    for (id, character) in &tree.characters {
        if !character.portraits.contains_key(&character.default_emotion) {
            report.push(
                IssueKind::MissingDefaultPortrait,
                None,
                None,
                format!(
                    "Character '{}' has no portrait for its default emotion '{}'",
                    id, character.default_emotion
                ),
            );
        }
    }

    let reachable: BTreeSet<&str> = reachable_node_ids(tree).into_iter().collect();
    let mut written: BTreeSet<&str> = BTreeSet::new();
    let mut read: Vec<(String, &str)> = Vec::new();
    let mut collided: BTreeSet<&str> = BTreeSet::new();

    for (key, node) in &tree.nodes {
        let key = key.as_str();
        if node.id != key {
            report.push(
                IssueKind::NodeIdMismatch,
                Some(key),
                None,
                format!("Node stored under '{}' has id '{}'", key, node.id),
            );
        }
        if tree.is_playable() && !reachable.contains(key) {
            report.push(
                IssueKind::UnreachableNode,
                Some(key),
                None,
                format!("Node '{}' cannot be reached from the start node", key),
            );
        }
        if !node.character.is_empty() && tree.character(&node.character).is_none() {
            report.push(
                IssueKind::UnknownCharacter,
                Some(key),
                None,
                format!("Node '{}' uses unknown character '{}'", key, node.character),
            );
        }

        for name in extract_variables(&node.text) {
            read.push((name, key));
        }
        for alternate in node.alternate_texts() {
            for name in extract_variables(&alternate.text) {
                read.push((name, key));
            }
            if let Some(p) = &alternate.prerequisites {
                check_operators(&mut report, p, key, None);
            }
        }

        for choice in &node.choices {
            if is_dangling(choice, tree) {
                let message = if choice.next_node_id.is_empty() {
                    format!("Choice '{}' in node '{}' has no target", choice.id, key)
                } else {
                    format!(
                        "Choice '{}' in node '{}' points to missing node '{}'",
                        choice.id, key, choice.next_node_id
                    )
                };
                report.push(IssueKind::DanglingChoice, Some(key), Some(choice.id.as_str()), message);
            }

            if let Some(status) = choice.exit_status() {
                let exit_id = exit_node_id(status);
                if tree.has_node(&exit_id) && collided.insert(status) {
                    report.push(
                        IssueKind::ExitIdCollision,
                        Some(key),
                        Some(choice.id.as_str()),
                        format!(
                            "Exit '{}' in node '{}' shares the graph id '{}' with a real node",
                            status, key, exit_id
                        ),
                    );
                }
            }

            for alternate in choice.alternate_destinations() {
                if !tree.has_node(&alternate.next_node_id) {
                    report.push(
                        IssueKind::DanglingAlternateDestination,
                        Some(key),
                        Some(choice.id.as_str()),
                        format!(
                            "Choice '{}' in node '{}' has an alternate destination to missing node '{}'",
                            choice.id, key, alternate.next_node_id
                        ),
                    );
                }
                check_operators(&mut report, &alternate.prerequisites, key, Some(choice.id.as_str()));
            }

            if let Some(p) = &choice.prerequisites {
                check_operators(&mut report, p, key, Some(choice.id.as_str()));
            }
            for change in choice.state_changes() {
                written.insert(change.key.as_str());
            }
            for name in extract_variables(&choice.text) {
                read.push((name, key));
            }
        }
    }

    let mut reported: BTreeSet<String> = BTreeSet::new();
    for (name, node_id) in read {
        if written.contains(name.as_str()) || reported.contains(&name) {
            continue;
        }
        report.push(
            IssueKind::UnwrittenVariable,
            Some(node_id),
            None,
            format!(
                "Variable '{}' in node '{}' is never set by any choice and shows VALUE_NOT_FOUND unless the host seeds it",
                name, node_id
            ),
        );
        reported.insert(name);
    }

    report
}

fn check_operators(report: &mut LintReport, p: &Prerequisites, node_id: &str, choice_id: Option<&str>) {
    for condition in p.state_conditions() {
        if !condition.operator.is_known() {
            report.push(
                IssueKind::UnknownOperator,
                Some(node_id),
                choice_id,
                format!(
                    "Condition on '{}' in node '{}' uses unknown operator '{}' and never holds",
                    condition.key, node_id, condition.operator
                ),
            );
        }
    }
}
