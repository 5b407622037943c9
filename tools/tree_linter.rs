/// Tree Linter: reports dangling references, unreachable nodes and other
/// authoring gaps in dialogue trees.
///
/// Usage: tree_linter <tree_file|tree_dir> [--strict]
///
/// Exits with status 1 when any tree has errors (or warnings, with --strict).

use dialogue_graph_engine::core::diagnostics::{lint, LintReport};
use dialogue_graph_engine::core::vocabulary::StoryVocabulary;
use dialogue_graph_engine::schema::tree::DialogueTree;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: tree_linter <tree_file|tree_dir> [--strict]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let strict = args[2..].iter().any(|a| a == "--strict");

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else if target.is_dir() {
        let mut files = Vec::new();
        collect_tree_files(target, &mut files);
        files.sort();
        files
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for path in &files {
        let tree = match DialogueTree::load_from_file(path) {
            Ok(tree) => tree,
            Err(e) => {
                println!("ERROR: {}: {}", path.display(), e);
                total_errors += 1;
                continue;
            }
        };

        let report = lint(&tree);
        print_report(path, &tree, &report);
        total_errors += report.errors().count();
        total_warnings += report.warnings().count();
    }

    println!(
        "\nSummary: {} trees, {} errors, {} warnings",
        files.len(),
        total_errors,
        total_warnings
    );

    if total_errors > 0 || (strict && total_warnings > 0) {
        process::exit(1);
    }
}

fn collect_tree_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_tree_files(&path, files);
            } else if matches!(path.extension().and_then(|s| s.to_str()), Some("json") | Some("ron")) {
                files.push(path);
            }
        }
    }
}

fn print_report(path: &Path, tree: &DialogueTree, report: &LintReport) {
    println!("\n=== {} ('{}', {} nodes) ===\n", path.display(), tree.name, tree.nodes.len());

    if report.is_clean() {
        println!("All checks passed!");
    }
    for warning in report.warnings() {
        println!("{}", warning);
    }
    for error in report.errors() {
        println!("{}", error);
    }

    let vocab = StoryVocabulary::collect(tree);
    if !vocab.flags.is_empty() {
        let flags: Vec<&str> = vocab.flags.iter().map(|s| s.as_str()).collect();
        println!("Flags: {}", flags.join(", "));
    }
    if !vocab.state_keys.is_empty() {
        let keys: Vec<&str> = vocab.state_keys.iter().map(|s| s.as_str()).collect();
        println!("State keys: {}", keys.join(", "));
    }
}
