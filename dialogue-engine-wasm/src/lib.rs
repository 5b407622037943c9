//! WASM bindings for dialogue-graph-engine: powers the browser editor's
//! preview pane and graph view. Everything crosses the boundary as JSON.

use wasm_bindgen::prelude::*;

use dialogue_graph_engine::core::condition::evaluate;
use dialogue_graph_engine::core::diagnostics::{choice_tooltip, is_dangling, lint};
use dialogue_graph_engine::core::layout::{layout_with, LayoutConfig, LayoutMode};
use dialogue_graph_engine::core::markup::{parse_markup, wrap_selection, Tag};
use dialogue_graph_engine::core::session::{
    OfferedChoice, PreviewSession, SessionConfig, SessionState, TerminalEvent, Transition,
};
use dialogue_graph_engine::core::variables;
use dialogue_graph_engine::schema::prerequisites::Prerequisites;
use dialogue_graph_engine::schema::state::{FlagSet, GameState};
use dialogue_graph_engine::schema::tree::DialogueTree;

// ---------------------------------------------------------------------------
// Embedded sample tree: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const TAVERN: &str = include_str!("../../dialogue_data/tavern.json");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ChoiceView {
    index: usize,
    id: String,
    text: String,
    spans: Vec<dialogue_graph_engine::core::markup::Span>,
    available: bool,
    dangling: bool,
    exit_status: Option<String>,
    locked_reason: Option<String>,
}

impl From<&OfferedChoice<'_>> for ChoiceView {
    fn from(offered: &OfferedChoice<'_>) -> Self {
        ChoiceView {
            index: offered.index,
            id: offered.choice.id.clone(),
            text: offered.text.clone(),
            spans: offered.spans.clone(),
            available: offered.available,
            dangling: offered.dangling,
            exit_status: offered.choice.exit_status().map(str::to_string),
            locked_reason: offered.locked_reason.clone(),
        }
    }
}

/// `status` alone cannot tell a dangling target from an authored exit that
/// happens to be named `missing_target`; `missingTarget` can.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TransitionView {
    ended: bool,
    node_id: Option<String>,
    status: Option<String>,
    missing_target: bool,
    missing_node_id: Option<String>,
}

impl From<Transition> for TransitionView {
    fn from(t: Transition) -> Self {
        match t {
            Transition::Advanced { node_id } => TransitionView {
                ended: false,
                node_id: Some(node_id),
                status: None,
                missing_target: false,
                missing_node_id: None,
            },
            Transition::Ended(event) => {
                let status = Some(event.status().to_string());
                match event {
                    TerminalEvent::Exit { .. } => TransitionView {
                        ended: true,
                        node_id: None,
                        status,
                        missing_target: false,
                        missing_node_id: None,
                    },
                    TerminalEvent::MissingTarget { node_id } => TransitionView {
                        ended: true,
                        node_id: None,
                        status,
                        missing_target: true,
                        missing_node_id: Some(node_id),
                    },
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn parse_tree(tree_json: &str) -> Result<DialogueTree, JsError> {
    DialogueTree::from_json_str(tree_json).map_err(|e| JsError::new(&e.to_string()))
}

fn parse_state(state_json: &str) -> Result<GameState, JsError> {
    if state_json.trim().is_empty() {
        return Ok(GameState::new());
    }
    serde_json::from_str(state_json).map_err(|e| JsError::new(&format!("Invalid state JSON: {e}")))
}

fn parse_flags(flags_json: &str) -> Result<FlagSet, JsError> {
    if flags_json.trim().is_empty() {
        return Ok(FlagSet::default());
    }
    let flags: Vec<String> = serde_json::from_str(flags_json)
        .map_err(|e| JsError::new(&format!("Invalid flags JSON: {e}")))?;
    Ok(flags.into_iter().collect())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

fn parse_tag(tag: &str) -> Result<Tag, JsError> {
    match tag {
        "b" => Ok(Tag::Bold),
        "i" => Ok(Tag::Italic),
        "s" => Ok(Tag::Strikethrough),
        other => match other.strip_prefix("color=") {
            Some(name) if !name.is_empty() => Ok(Tag::Color(name.to_string())),
            _ => Err(JsError::new(&format!("Unknown tag: {other}"))),
        },
    }
}

// ---------------------------------------------------------------------------
// Stateless entry points
// ---------------------------------------------------------------------------

/// Layout as JSON. `compact` selects longest-path depths.
#[wasm_bindgen]
pub fn layout_json(tree_json: &str, compact: bool) -> Result<String, JsError> {
    let tree = parse_tree(tree_json)?;
    let mode = if compact {
        LayoutMode::Compact
    } else {
        LayoutMode::FirstDiscovery
    };
    to_json(&layout_with(&tree, &LayoutConfig::default(), mode))
}

#[wasm_bindgen]
pub fn parse_markup_json(text: &str) -> Result<String, JsError> {
    to_json(&parse_markup(text))
}

/// Returns `[newText, cursor]`.
#[wasm_bindgen]
pub fn wrap_selection_json(text: &str, start: usize, end: usize, tag: &str) -> Result<String, JsError> {
    let tag = parse_tag(tag)?;
    to_json(&wrap_selection(text, start, end, &tag))
}

#[wasm_bindgen]
pub fn substitute(text: &str, state_json: &str) -> Result<String, JsError> {
    Ok(variables::substitute(text, &parse_state(state_json)?))
}

#[wasm_bindgen]
pub fn extract_variables(text: &str) -> Result<String, JsError> {
    to_json(&variables::extract_variables(text))
}

/// Empty `prerequisites_json` means absent prerequisites.
#[wasm_bindgen]
pub fn evaluate_json(prerequisites_json: &str, flags_json: &str, state_json: &str) -> Result<bool, JsError> {
    let prerequisites: Option<Prerequisites> = if prerequisites_json.trim().is_empty() {
        None
    } else {
        serde_json::from_str(prerequisites_json)
            .map_err(|e| JsError::new(&format!("Invalid prerequisites JSON: {e}")))?
    };
    Ok(evaluate(
        prerequisites.as_ref(),
        &parse_flags(flags_json)?,
        &parse_state(state_json)?,
    ))
}

#[wasm_bindgen]
pub fn lint_json(tree_json: &str) -> Result<String, JsError> {
    to_json(&lint(&parse_tree(tree_json)?))
}

/// Per-choice graph annotations: `[{nodeId, choiceId, dangling, tooltip}]`.
#[wasm_bindgen]
pub fn choice_annotations_json(tree_json: &str) -> Result<String, JsError> {
    #[derive(serde::Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Annotation<'a> {
        node_id: &'a str,
        choice_id: &'a str,
        dangling: bool,
        tooltip: Option<String>,
    }

    let tree = parse_tree(tree_json)?;
    let annotations: Vec<Annotation> = tree
        .choices()
        .map(|(node_id, choice)| Annotation {
            node_id,
            choice_id: &choice.id,
            dangling: is_dangling(choice, &tree),
            tooltip: choice_tooltip(choice, &tree),
        })
        .collect();
    to_json(&annotations)
}

#[wasm_bindgen]
pub fn sample_tree_json() -> String {
    data::TAVERN.to_string()
}

// ---------------------------------------------------------------------------
// Preview session
// ---------------------------------------------------------------------------

/// A preview session owned by JavaScript. Keeps its own copy of the tree.
#[wasm_bindgen]
pub struct PreviewHandle {
    tree: DialogueTree,
    config: SessionConfig,
    state: SessionState,
}

#[wasm_bindgen]
impl PreviewHandle {
    /// Start a session. `seeds_json` is an object of state defaults (may be
    /// empty); `seed_known` starts every referenced state key at 0.
    #[wasm_bindgen(constructor)]
    pub fn new(
        tree_json: &str,
        seeds_json: &str,
        seed_known: bool,
        default_portrait: Option<String>,
    ) -> Result<PreviewHandle, JsError> {
        let tree = parse_tree(tree_json)?;
        let seeds = parse_state(seeds_json)?;

        let mut builder = PreviewSession::builder(&tree);
        for (key, value) in seeds.sorted() {
            builder = builder.seed_state(key, value);
        }
        if seed_known {
            builder = builder.seed_known_keys();
        }
        if let Some(ref asset) = default_portrait {
            builder = builder.default_portrait(asset);
        }
        let config = builder.config();
        let state = PreviewSession::with_config(&tree, config.clone()).into_state();

        Ok(PreviewHandle { tree, config, state })
    }

    /// Session over the bundled sample tree with known keys seeded.
    pub fn sample() -> Result<PreviewHandle, JsError> {
        PreviewHandle::new(data::TAVERN, "{\"gold\": 10}", true, None)
    }

    pub fn transcript(&self) -> Result<String, JsError> {
        to_json(&self.state.transcript)
    }

    pub fn choices(&self) -> Result<String, JsError> {
        let session = self.session();
        let views: Vec<ChoiceView> = session.offered_choices().iter().map(ChoiceView::from).collect();
        to_json(&views)
    }

    pub fn apply_choice(&mut self, choice_id: &str) -> Result<String, JsError> {
        let result = self.with_session(|s| s.apply_choice(choice_id));
        let transition = result.map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&TransitionView::from(transition))
    }

    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        let result = self.with_session(|s| s.choose(index));
        let transition = result.map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&TransitionView::from(transition))
    }

    pub fn toggle_flag(&mut self, flag: &str) -> bool {
        self.with_session(|s| s.toggle_flag(flag))
    }

    pub fn set_state(&mut self, key: &str, value: i64) {
        self.with_session(|s| s.set_state(key, value));
    }

    pub fn reset(&mut self) {
        self.with_session(|s| s.reset());
    }

    pub fn is_ended(&self) -> bool {
        self.session().is_ended()
    }

    pub fn current_node_id(&self) -> String {
        self.state.current_node_id.clone()
    }

    /// Full snapshot (flags, state, transcript, status) as JSON.
    pub fn snapshot(&self) -> Result<String, JsError> {
        to_json(&self.state)
    }
}

// Private helpers
impl PreviewHandle {
    fn session(&self) -> PreviewSession<'_> {
        PreviewSession::resume(&self.tree, self.config.clone(), self.state.clone())
    }

    fn with_session<R>(&mut self, f: impl FnOnce(&mut PreviewSession<'_>) -> R) -> R {
        let mut session = PreviewSession::resume(&self.tree, self.config.clone(), self.state.clone());
        let out = f(&mut session);
        self.state = session.into_state();
        out
    }
}
