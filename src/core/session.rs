//! Preview interpreter: a simulated play-through of a dialogue tree.
//!
//! A session borrows its tree and owns everything else (current node,
//! flags, numeric state, transcript). It only moves when the player makes
//! a choice, and once a conversation ends it refuses further choices until
//! [`PreviewSession::reset`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::condition::{evaluate, select_first_match};
use crate::core::diagnostics::{is_dangling, locked_reason};
use crate::core::markup::{parse_markup, Span};
use crate::core::portrait::portrait_for;
use crate::core::variables::substitute;
use crate::core::vocabulary::StoryVocabulary;
use crate::schema::choice::DialogueChoice;
use crate::schema::state::{FlagSet, GameState};
use crate::schema::tree::{DialogueNode, DialogueTree};

/// Status reported when a conversation runs into a node id that does not exist.
pub const MISSING_TARGET_STATUS: &str = "missing_target";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("conversation has ended ({0}); reset to continue")]
    Ended(TerminalEvent),
    #[error("no choice '{0}' at the current node")]
    UnknownChoice(String),
    #[error("choice index {0} is out of range")]
    ChoiceOutOfRange(usize),
    #[error("choice '{0}' is locked by its prerequisites")]
    ChoiceLocked(String),
}

/// Why a conversation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalEvent {
    /// A choice with an `exit` was taken.
    Exit { status: String },
    /// The resolved destination (or the start node) does not exist.
    MissingTarget { node_id: String },
}

impl TerminalEvent {
    pub fn status(&self) -> &str {
        match self {
            Self::Exit { status } => status,
            Self::MissingTarget { .. } => MISSING_TARGET_STATUS,
        }
    }
}

impl fmt::Display for TerminalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit { status } => write!(f, "exit: {}", status),
            Self::MissingTarget { node_id } => write!(f, "missing target node '{}'", node_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Ended(TerminalEvent),
}

/// One line of the conversation as it was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub node_id: String,
    pub speaker: String,
    /// Authored text (node or alternate), before interpolation.
    pub raw_text: String,
    /// Text with variables substituted.
    pub text: String,
    pub spans: Vec<Span>,
    pub emotion: Option<String>,
    pub portrait: Option<String>,
    /// Authored text of the choice that led here; `None` for the opening line.
    pub via_choice: Option<String>,
}

/// Result of a successful choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Advanced { node_id: String },
    Ended(TerminalEvent),
}

/// A choice at the current node, as it would be presented.
#[derive(Debug, Clone)]
pub struct OfferedChoice<'t> {
    pub index: usize,
    pub choice: &'t DialogueChoice,
    pub available: bool,
    pub text: String,
    pub spans: Vec<Span>,
    pub dangling: bool,
    pub locked_reason: Option<String>,
}

/// Everything a session owns. Serializable so hosts can park and resume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_node_id: String,
    pub flags: FlagSet,
    pub state: GameState,
    pub transcript: Vec<Message>,
    pub status: SessionStatus,
}

/// Host-provided starting conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub initial_state: GameState,
    pub default_portrait: Option<String>,
}

/// Builder for constructing a `PreviewSession`.
pub struct PreviewSessionBuilder<'t> {
    tree: &'t DialogueTree,
    seeded: Vec<(String, i64)>,
    seed_known_keys: bool,
    default_portrait: Option<String>,
}

impl<'t> PreviewSessionBuilder<'t> {
    /// Start `key` at `value` instead of absent.
    pub fn seed_state(mut self, key: &str, value: i64) -> Self {
        self.seeded.push((key.to_string(), value));
        self
    }

    /// Start every state key the tree mentions at 0.
    pub fn seed_known_keys(mut self) -> Self {
        self.seed_known_keys = true;
        self
    }

    /// Asset used when neither the emotion nor the default emotion has a portrait.
    pub fn default_portrait(mut self, asset: &str) -> Self {
        self.default_portrait = Some(asset.to_string());
        self
    }

    pub fn config(&self) -> SessionConfig {
        let mut initial_state = GameState::new();
        for (key, value) in &self.seeded {
            initial_state.set(key.clone(), *value);
        }
        if self.seed_known_keys {
            for key in StoryVocabulary::collect(self.tree).state_keys {
                initial_state.seed(key, 0);
            }
        }
        SessionConfig {
            initial_state,
            default_portrait: self.default_portrait.clone(),
        }
    }

    pub fn build(self) -> PreviewSession<'t> {
        let config = self.config();
        PreviewSession::with_config(self.tree, config)
    }
}

/// A running preview over a borrowed tree.
#[derive(Debug, Clone)]
pub struct PreviewSession<'t> {
    tree: &'t DialogueTree,
    config: SessionConfig,
    snapshot: SessionState,
}

impl<'t> PreviewSession<'t> {
    pub fn builder(tree: &'t DialogueTree) -> PreviewSessionBuilder<'t> {
        PreviewSessionBuilder {
            tree,
            seeded: Vec::new(),
            seed_known_keys: false,
            default_portrait: None,
        }
    }

    /// Start at the tree's start node with no flags and empty state.
    pub fn new(tree: &'t DialogueTree) -> Self {
        Self::with_config(tree, SessionConfig::default())
    }

    pub fn with_config(tree: &'t DialogueTree, config: SessionConfig) -> Self {
        let snapshot = initial_snapshot(tree, &config);
        Self {
            tree,
            config,
            snapshot,
        }
    }

    /// Continue from a previously taken snapshot.
    pub fn resume(tree: &'t DialogueTree, config: SessionConfig, snapshot: SessionState) -> Self {
        Self {
            tree,
            config,
            snapshot,
        }
    }

    pub fn tree(&self) -> &'t DialogueTree {
        self.tree
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &SessionState {
        &self.snapshot
    }

    pub fn into_state(self) -> SessionState {
        self.snapshot
    }

    pub fn current_node_id(&self) -> &str {
        &self.snapshot.current_node_id
    }

    pub fn current_node(&self) -> Option<&'t DialogueNode> {
        self.tree.node(&self.snapshot.current_node_id)
    }

    pub fn flags(&self) -> &FlagSet {
        &self.snapshot.flags
    }

    pub fn state(&self) -> &GameState {
        &self.snapshot.state
    }

    pub fn transcript(&self) -> &[Message] {
        &self.snapshot.transcript
    }

    pub fn status(&self) -> &SessionStatus {
        &self.snapshot.status
    }

    pub fn terminal_event(&self) -> Option<&TerminalEvent> {
        match &self.snapshot.status {
            SessionStatus::Ended(event) => Some(event),
            SessionStatus::Active => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.terminal_event().is_some()
    }

    /// Portrait of the most recent line.
    pub fn current_portrait(&self) -> Option<&str> {
        self.snapshot
            .transcript
            .last()
            .and_then(|m| m.portrait.as_deref())
    }

    /// Every choice of the current node, locked ones included.
    /// Empty once the conversation has ended.
    pub fn offered_choices(&self) -> Vec<OfferedChoice<'t>> {
        if self.is_ended() {
            return Vec::new();
        }
        let Some(node) = self.current_node() else {
            return Vec::new();
        };

        let flags = &self.snapshot.flags;
        let state = &self.snapshot.state;
        node.choices
            .iter()
            .enumerate()
            .map(|(index, choice)| {
                let available = evaluate(choice.prerequisites.as_ref(), flags, state);
                let text = substitute(&choice.text, state);
                OfferedChoice {
                    index,
                    choice,
                    available,
                    spans: parse_markup(&text),
                    text,
                    dangling: is_dangling(choice, self.tree),
                    locked_reason: if available {
                        None
                    } else {
                        locked_reason(choice, flags)
                    },
                }
            })
            .collect()
    }

    /// Take the choice with `choice_id` at the current node.
    pub fn apply_choice(&mut self, choice_id: &str) -> Result<Transition, SessionError> {
        self.ensure_active()?;
        let choice = self
            .current_node()
            .and_then(|node| node.choice(choice_id))
            .ok_or_else(|| SessionError::UnknownChoice(choice_id.to_string()))?;
        self.take(choice)
    }

    /// Take the `index`-th choice at the current node.
    pub fn choose(&mut self, index: usize) -> Result<Transition, SessionError> {
        self.ensure_active()?;
        let choice = self
            .current_node()
            .and_then(|node| node.choices.get(index))
            .ok_or(SessionError::ChoiceOutOfRange(index))?;
        self.take(choice)
    }

    /// Back to the start node with the configured initial state.
    pub fn reset(&mut self) {
        debug!(tree = %self.tree.name, "resetting preview session");
        self.snapshot = initial_snapshot(self.tree, &self.config);
    }

    pub fn set_flag(&mut self, flag: &str) {
        self.snapshot.flags.insert(flag.to_string());
    }

    pub fn clear_flag(&mut self, flag: &str) {
        self.snapshot.flags.remove(flag);
    }

    /// Flip `flag`; returns whether it is now set.
    pub fn toggle_flag(&mut self, flag: &str) -> bool {
        if self.snapshot.flags.remove(flag) {
            false
        } else {
            self.snapshot.flags.insert(flag.to_string());
            true
        }
    }

    pub fn set_state(&mut self, key: &str, value: i64) {
        self.snapshot.state.set(key, value);
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match &self.snapshot.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Ended(event) => Err(SessionError::Ended(event.clone())),
        }
    }

    fn take(&mut self, choice: &'t DialogueChoice) -> Result<Transition, SessionError> {
        if !evaluate(choice.prerequisites.as_ref(), &self.snapshot.flags, &self.snapshot.state) {
            return Err(SessionError::ChoiceLocked(choice.id.clone()));
        }

        // 1. Flag changes: removals strictly before additions
        if let Some(changes) = &choice.flag_changes {
            for flag in changes.removed() {
                self.snapshot.flags.remove(flag);
            }
            for flag in changes.added() {
                self.snapshot.flags.insert(flag.clone());
            }
        }

        // 2. State changes, each seeing the previous ones
        for change in choice.state_changes() {
            let current = self.snapshot.state.get(&change.key);
            let next = change.operation().apply(current, change.value);
            trace!(key = %change.key, current, next, "state change");
            self.snapshot.state.set(change.key.clone(), next);
        }

        // 3. Exit wins over any destination
        if let Some(exit) = &choice.exit {
            return Ok(self.end(TerminalEvent::Exit {
                status: exit.status.clone(),
            }));
        }

        // 4. Destination against post-change flags and state
        let destination = select_first_match(
            choice.alternate_destinations(),
            &self.snapshot.flags,
            &self.snapshot.state,
        )
        .map(|alternate| alternate.next_node_id.as_str())
        .unwrap_or(choice.next_node_id.as_str());

        let Some(node) = self.tree.node(destination).filter(|_| !destination.is_empty()) else {
            return Ok(self.end(TerminalEvent::MissingTarget {
                node_id: destination.to_string(),
            }));
        };

        // 5. Move and record the line
        debug!(from = %self.snapshot.current_node_id, to = %destination, choice = %choice.id, "advanced");
        let message = render_line(
            self.tree,
            &self.config,
            node,
            &self.snapshot.flags,
            &self.snapshot.state,
            Some(choice.text.clone()),
        );
        self.snapshot.current_node_id = destination.to_string();
        self.snapshot.transcript.push(message);

        Ok(Transition::Advanced {
            node_id: destination.to_string(),
        })
    }

    fn end(&mut self, event: TerminalEvent) -> Transition {
        debug!(event = %event, "conversation ended");
        self.snapshot.status = SessionStatus::Ended(event.clone());
        Transition::Ended(event)
    }
}

fn initial_snapshot(tree: &DialogueTree, config: &SessionConfig) -> SessionState {
    let flags = FlagSet::default();
    let state = config.initial_state.clone();

    let (transcript, status) = match tree.start_node() {
        Some(node) => (
            vec![render_line(tree, config, node, &flags, &state, None)],
            SessionStatus::Active,
        ),
        None => (
            Vec::new(),
            SessionStatus::Ended(TerminalEvent::MissingTarget {
                node_id: tree.start_node_id.clone(),
            }),
        ),
    };

    SessionState {
        current_node_id: tree.start_node_id.clone(),
        flags,
        state,
        transcript,
        status,
    }
}

/// Resolve a node's displayed line: first matching alternate text (falling
/// back to the node's own text), variables substituted, markup parsed.
fn render_line(
    tree: &DialogueTree,
    config: &SessionConfig,
    node: &DialogueNode,
    flags: &FlagSet,
    state: &GameState,
    via_choice: Option<String>,
) -> Message {
    let (raw_text, emotion) = match select_first_match(node.alternate_texts(), flags, state) {
        Some(alternate) => (
            alternate.text.clone(),
            alternate
                .emotion
                .clone()
                .filter(|e| !e.is_empty())
                .or_else(|| node.emotion.clone()),
        ),
        None => (node.text.clone(), node.emotion.clone()),
    };

    let text = substitute(&raw_text, state);
    let portrait = portrait_for(
        tree,
        &node.character,
        emotion.as_deref(),
        config.default_portrait.as_deref(),
    )
    .map(str::to_string);

    Message {
        node_id: node.id.clone(),
        speaker: node.speaker.clone(),
        spans: parse_markup(&text),
        raw_text,
        text,
        emotion,
        portrait,
        via_choice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::choice::{StateChange, StateOperation};
    use crate::schema::prerequisites::{ComparisonOperator, Prerequisites, StateCondition};
    use crate::schema::tree::{AlternateText, Character};

    fn two_node_tree() -> DialogueTree {
        DialogueTree::new("simple", "a")
            .with_node(
                DialogueNode::new("a", "Petra", "Hello.")
                    .with_choice(DialogueChoice::new("to_b", "Hi", "b")),
            )
            .with_node(DialogueNode::new("b", "Petra", "Goodbye."))
    }

    #[test]
    fn starts_with_one_line() {
        let tree = two_node_tree();
        let session = PreviewSession::new(&tree);
        assert_eq!(session.current_node_id(), "a");
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].text, "Hello.");
        assert_eq!(session.transcript()[0].via_choice, None);
        assert!(session.flags().is_empty());
        assert_eq!(session.status(), &SessionStatus::Active);
    }

    #[test]
    fn choice_advances_and_appends_one_entry() {
        let tree = two_node_tree();
        let mut session = PreviewSession::new(&tree);
        let t = session.apply_choice("to_b").unwrap();
        assert_eq!(t, Transition::Advanced { node_id: "b".into() });
        assert_eq!(session.current_node_id(), "b");
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].via_choice.as_deref(), Some("Hi"));

        session.reset();
        assert_eq!(session.current_node_id(), "a");
        assert!(session.flags().is_empty());
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn exit_choice_ends_and_rejects_further_choices() {
        let tree = DialogueTree::new("exit", "a").with_node(
            DialogueNode::new("a", "Merchant", "Browse?")
                .with_choice(DialogueChoice::exit("shop", "Show me", "shop"))
                .with_choice(DialogueChoice::new("stay", "Stay", "a")),
        );
        let mut session = PreviewSession::new(&tree);
        let t = session.apply_choice("shop").unwrap();
        assert_eq!(t, Transition::Ended(TerminalEvent::Exit { status: "shop".into() }));
        assert_eq!(session.terminal_event().unwrap().status(), "shop");
        assert!(session.offered_choices().is_empty());

        let err = session.apply_choice("stay").unwrap_err();
        assert!(matches!(err, SessionError::Ended(TerminalEvent::Exit { .. })));
        assert!(session.choose(0).is_err());

        session.reset();
        assert!(!session.is_ended());
        assert!(session.apply_choice("stay").is_ok());
    }

    #[test]
    fn missing_target_is_a_terminal_event() {
        let tree = DialogueTree::new("dangling", "a").with_node(
            DialogueNode::new("a", "Guard", "Halt.")
                .with_choice(DialogueChoice::new("c", "Run", "nowhere"))
                .with_choice(DialogueChoice::new("e", "Wait", "")),
        );
        let mut session = PreviewSession::new(&tree);
        let t = session.apply_choice("c").unwrap();
        assert_eq!(
            t,
            Transition::Ended(TerminalEvent::MissingTarget {
                node_id: "nowhere".into()
            })
        );
        assert_eq!(session.terminal_event().unwrap().status(), MISSING_TARGET_STATUS);
        assert_eq!(session.transcript().len(), 1);

        session.reset();
        assert!(matches!(
            session.apply_choice("e").unwrap(),
            Transition::Ended(TerminalEvent::MissingTarget { .. })
        ));
    }

    #[test]
    fn missing_start_node_ends_immediately() {
        let tree = DialogueTree::new("broken", "ghost");
        let session = PreviewSession::new(&tree);
        assert!(session.transcript().is_empty());
        assert_eq!(
            session.terminal_event(),
            Some(&TerminalEvent::MissingTarget {
                node_id: "ghost".into()
            })
        );
    }

    #[test]
    fn removal_precedes_addition() {
        let tree = DialogueTree::new("flags", "a")
            .with_node(
                DialogueNode::new("a", "N", "x").with_choice(
                    DialogueChoice::new("c", "go", "b").with_flag_changes(&["both", "new"], &["both", "old"]),
                ),
            )
            .with_node(DialogueNode::new("b", "N", "y"));
        let mut session = PreviewSession::new(&tree);
        session.set_flag("old");
        session.apply_choice("c").unwrap();
        assert!(session.flags().contains("both"));
        assert!(session.flags().contains("new"));
        assert!(!session.flags().contains("old"));
    }

    #[test]
    fn state_changes_apply_in_order() {
        let tree = DialogueTree::new("state", "a")
            .with_node(
                DialogueNode::new("a", "N", "x").with_choice(
                    DialogueChoice::new("c", "go", "b")
                        .with_state_change(StateChange::new("gold", 10, StateOperation::Set))
                        .with_state_change(StateChange::new("gold", 3, StateOperation::Add))
                        .with_state_change(StateChange::new("gold", 5, StateOperation::Subtract))
                        .with_state_change(StateChange {
                            key: "rep".into(),
                            value: 7,
                            operation: None,
                        }),
                ),
            )
            .with_node(DialogueNode::new("b", "N", "You have {$$gold} gold and {$$rep} rep."));
        let mut session = PreviewSession::new(&tree);
        session.apply_choice("c").unwrap();
        assert_eq!(session.state().get("gold"), 8);
        assert_eq!(session.state().get("rep"), 7);
        assert_eq!(session.transcript()[1].text, "You have 8 gold and 7 rep.");
    }

    #[test]
    fn locked_choice_is_rejected_without_side_effects() {
        let tree = DialogueTree::new("locked", "a")
            .with_node(
                DialogueNode::new("a", "N", "x").with_choice(
                    DialogueChoice::new("c", "go", "b")
                        .with_prerequisites(Prerequisites::default().require("key"))
                        .with_flag_changes(&["used_key"], &[]),
                ),
            )
            .with_node(DialogueNode::new("b", "N", "y"));
        let mut session = PreviewSession::new(&tree);

        let offered = session.offered_choices();
        assert!(!offered[0].available);
        assert_eq!(offered[0].locked_reason.as_deref(), Some("Required flags: key"));

        assert_eq!(
            session.apply_choice("c").unwrap_err(),
            SessionError::ChoiceLocked("c".into())
        );
        assert!(session.flags().is_empty());
        assert_eq!(session.current_node_id(), "a");

        session.set_flag("key");
        assert!(session.offered_choices()[0].available);
        assert!(session.apply_choice("c").is_ok());
    }

    #[test]
    fn unknown_choice_and_index() {
        let tree = two_node_tree();
        let mut session = PreviewSession::new(&tree);
        assert_eq!(
            session.apply_choice("nope").unwrap_err(),
            SessionError::UnknownChoice("nope".into())
        );
        assert_eq!(session.choose(3).unwrap_err(), SessionError::ChoiceOutOfRange(3));
        assert!(session.choose(0).is_ok());
    }

    #[test]
    fn alternate_destination_uses_post_change_state() {
        let tree = DialogueTree::new("alt", "a")
            .with_node(
                DialogueNode::new("a", "N", "x").with_choice(
                    DialogueChoice::new("c", "go", "plain")
                        .with_flag_changes(&["vip"], &[])
                        .with_alternate_destination("lounge", Prerequisites::default().require("vip"))
                        .with_alternate_destination("other", Prerequisites::default()),
                ),
            )
            .with_node(DialogueNode::new("plain", "N", "plain"))
            .with_node(DialogueNode::new("lounge", "N", "lounge"))
            .with_node(DialogueNode::new("other", "N", "other"));
        let mut session = PreviewSession::new(&tree);
        assert_eq!(
            session.apply_choice("c").unwrap(),
            Transition::Advanced {
                node_id: "lounge".into()
            }
        );
    }

    #[test]
    fn alternate_text_and_emotion_selection() {
        let tree = DialogueTree::new("alt_text", "a")
            .with_character(
                "petra",
                Character {
                    name: "Petra".into(),
                    default_emotion: "neutral".into(),
                    portraits: [("neutral", "n.png"), ("happy", "h.png"), ("sad", "s.png")]
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
            )
            .with_node(
                DialogueNode::new("a", "Petra", "Who are you?")
                    .with_character("petra")
                    .with_emotion("sad")
                    .with_alternate_text(AlternateText {
                        text: "Rich friend! {$$gold} gold!".into(),
                        emotion: Some("happy".into()),
                        prerequisites: Some(Prerequisites::default().when(StateCondition::new(
                            "gold",
                            ComparisonOperator::Ge,
                            100,
                        ))),
                    })
                    .with_alternate_text(AlternateText {
                        text: "Oh, it's you.".into(),
                        emotion: None,
                        prerequisites: Some(Prerequisites::default().require("met")),
                    }),
            );

        let plain = PreviewSession::new(&tree);
        assert_eq!(plain.transcript()[0].text, "Who are you?");
        assert_eq!(plain.current_portrait(), Some("s.png"));

        let poor = PreviewSession::builder(&tree).seed_state("gold", 5).build();
        assert_eq!(poor.transcript()[0].raw_text, "Who are you?");

        let rich = PreviewSession::builder(&tree).seed_state("gold", 150).build();
        assert_eq!(rich.transcript()[0].text, "Rich friend! 150 gold!");
        assert_eq!(rich.transcript()[0].emotion.as_deref(), Some("happy"));
        assert_eq!(rich.current_portrait(), Some("h.png"));
    }

    #[test]
    fn alternate_without_emotion_keeps_node_emotion() {
        let tree = DialogueTree::new("t", "a").with_node(
            DialogueNode::new("a", "N", "base")
                .with_emotion("tired")
                .with_alternate_text(AlternateText {
                    text: "always".into(),
                    emotion: None,
                    prerequisites: None,
                }),
        );
        let session = PreviewSession::new(&tree);
        assert_eq!(session.transcript()[0].text, "always");
        assert_eq!(session.transcript()[0].emotion.as_deref(), Some("tired"));
    }

    #[test]
    fn alternate_with_empty_emotion_keeps_node_emotion() {
        let tree = DialogueTree::new("t", "a").with_node(
            DialogueNode::new("a", "N", "base")
                .with_emotion("tired")
                .with_alternate_text(AlternateText {
                    text: "always".into(),
                    emotion: Some(String::new()),
                    prerequisites: None,
                }),
        );
        let session = PreviewSession::new(&tree);
        assert_eq!(session.transcript()[0].emotion.as_deref(), Some("tired"));
    }

    #[test]
    fn seeded_known_keys_render_zero() {
        let tree = DialogueTree::new("t", "a")
            .with_node(DialogueNode::new("a", "N", "Gold: {$$gold}, xp: {$$xp}"));
        let unseeded = PreviewSession::new(&tree);
        assert_eq!(unseeded.transcript()[0].text, "Gold: VALUE_NOT_FOUND, xp: VALUE_NOT_FOUND");

        let seeded = PreviewSession::builder(&tree)
            .seed_state("xp", 450)
            .seed_known_keys()
            .build();
        assert_eq!(seeded.transcript()[0].text, "Gold: 0, xp: 450");
    }

    #[test]
    fn manual_flag_editing() {
        let tree = two_node_tree();
        let mut session = PreviewSession::new(&tree);
        assert!(session.toggle_flag("x"));
        assert!(session.flags().contains("x"));
        assert!(!session.toggle_flag("x"));
        session.set_flag("y");
        session.clear_flag("y");
        assert!(session.flags().is_empty());
        session.set_state("gold", 4);
        assert_eq!(session.state().get("gold"), 4);
        session.reset();
        assert_eq!(session.state().value("gold"), None);
    }

    #[test]
    fn snapshot_resume() {
        let tree = two_node_tree();
        let mut session = PreviewSession::new(&tree);
        session.set_flag("kept");
        let config = session.config().clone();
        let snapshot = session.into_state();

        let mut resumed = PreviewSession::resume(&tree, config, snapshot);
        assert!(resumed.flags().contains("kept"));
        resumed.apply_choice("to_b").unwrap();
        assert_eq!(resumed.current_node_id(), "b");
    }

    #[test]
    fn terminal_event_display() {
        assert_eq!(TerminalEvent::Exit { status: "shop".into() }.to_string(), "exit: shop");
        assert_eq!(
            SessionError::Ended(TerminalEvent::MissingTarget { node_id: "x".into() }).to_string(),
            "conversation has ended (missing target node 'x'); reset to continue"
        );
    }
}
