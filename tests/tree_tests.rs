/// Tree integration tests: loading, malformed input and lint reports.

use dialogue_graph_engine::core::diagnostics::{choice_tooltip, is_dangling, lint, IssueKind, Severity};
use dialogue_graph_engine::core::store::{MemoryStore, TreeStore};
use dialogue_graph_engine::core::vocabulary::StoryVocabulary;
use dialogue_graph_engine::schema::tree::{DialogueTree, TreeError};
use std::path::Path;

#[test]
fn bundled_tree_loads_and_lints_clean() {
    let tree = DialogueTree::load_from_file(Path::new("dialogue_data/tavern.json")).unwrap();
    assert_eq!(tree.name, "The Rusty Flagon");
    assert_eq!(tree.nodes.len(), 5);
    assert_eq!(tree.characters.len(), 2);
    assert!(tree.is_playable());

    let report = lint(&tree);
    assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
}

#[test]
fn bundled_tree_vocabulary() {
    let tree = DialogueTree::load_from_file(Path::new("dialogue_data/tavern.json")).unwrap();
    let vocab = StoryVocabulary::collect(&tree);
    let flags: Vec<&str> = vocab.flags.iter().map(|s| s.as_str()).collect();
    assert_eq!(
        flags,
        vec!["guard_watching", "knows_about_hale", "met_petra", "tipsy"]
    );
    let keys: Vec<&str> = vocab.state_keys.iter().map(|s| s.as_str()).collect();
    assert_eq!(keys, vec!["gold", "reputation"]);
}

#[test]
fn ron_fixture_loads() {
    let tree = DialogueTree::load_from_file(Path::new("tests/fixtures/gatehouse.ron")).unwrap();
    assert_eq!(tree.start_node_id, "gate");
    let keys: Vec<&str> = tree.nodes.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["gate", "hall", "yard"]);
    assert!(lint(&tree).is_clean());
}

#[test]
fn malformed_input_is_reported_distinctly() {
    let err = DialogueTree::load_from_file(Path::new("tests/fixtures/not_a_tree.json")).unwrap_err();
    assert!(matches!(err, TreeError::Json(_)));

    let err = DialogueTree::load_from_file(Path::new("tests/fixtures/does_not_exist.json")).unwrap_err();
    assert!(matches!(err, TreeError::Io(_)));

    assert!(DialogueTree::from_ron_str("(name: \"x\")").is_err());
}

#[test]
fn broken_fixture_lint_report() {
    let tree =
        DialogueTree::load_from_file(Path::new("tests/fixtures/workshop_broken.json")).unwrap();
    let report = lint(&tree);

    let kinds: Vec<&IssueKind> = report.issues.iter().map(|i| &i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            &IssueKind::MissingDefaultPortrait,
            &IssueKind::DanglingChoice,
            &IssueKind::DanglingChoice,
            &IssueKind::UnknownOperator,
            &IssueKind::UnreachableNode,
            &IssueKind::UnknownCharacter,
            &IssueKind::UnwrittenVariable,
        ]
    );
    assert!(!report.has_errors());
    assert!(report.issues.iter().all(|i| i.severity == Severity::Warning));

    let dangling: Vec<Option<&str>> = report
        .of_kind(&IssueKind::DanglingChoice)
        .map(|i| i.choice_id.as_deref())
        .collect();
    assert_eq!(dangling, vec![Some("order"), Some("haggle")]);
}

#[test]
fn tooltips_on_broken_fixture() {
    let tree =
        DialogueTree::load_from_file(Path::new("tests/fixtures/workshop_broken.json")).unwrap();
    let forge = tree.node("forge").unwrap();

    assert!(is_dangling(&forge.choices[0], &tree));
    assert_eq!(
        choice_tooltip(&forge.choices[0], &tree).as_deref(),
        Some("Missing target node!")
    );
    assert_eq!(
        choice_tooltip(&forge.choices[1], &tree).as_deref(),
        Some("Missing target node!")
    );
    assert_eq!(choice_tooltip(&forge.choices[2], &tree), None);
}

#[test]
fn store_round_trip_keeps_authored_order() {
    let tree = DialogueTree::load_from_file(Path::new("dialogue_data/tavern.json")).unwrap();
    let mut store = MemoryStore::new();
    store.save(&tree);

    let loaded = store.load().unwrap();
    let before: Vec<&String> = tree.nodes.keys().collect();
    let after: Vec<&String> = loaded.nodes.keys().collect();
    assert_eq!(before, after);
}
