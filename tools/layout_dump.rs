/// Layout Dump: prints the computed graph layout of a dialogue tree.
///
/// Usage: layout_dump <tree_file> [--config <layout.ron>] [--compact] [--ron]

use dialogue_graph_engine::core::layout::{layout_with, LayoutConfig, LayoutMode};
use dialogue_graph_engine::schema::tree::DialogueTree;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: layout_dump <tree_file> [--config <layout.ron>] [--compact] [--ron]");
        process::exit(0);
    }

    let mut config_path = None;
    let mut mode = LayoutMode::FirstDiscovery;
    let mut as_ron = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--compact" => mode = LayoutMode::Compact,
            "--ron" => as_ron = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let tree = match DialogueTree::load_from_file(Path::new(&args[1])) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("ERROR: Failed to load tree '{}': {}", args[1], e);
            process::exit(1);
        }
    };

    let config = match config_path {
        Some(ref path) => match LayoutConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
        None => LayoutConfig::default(),
    };

    let layout = layout_with(&tree, &config, mode);

    if as_ron {
        match layout.to_ron() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("ERROR: Failed to serialize layout: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("=== Layout of '{}' ({:?}) ===\n", tree.name, mode);
    for node in &layout.nodes {
        println!(
            "  {:<24} depth {:>2}  x {:>7.1}  y {:>8.1}  h {:>5.1}",
            node.id, node.depth, node.position.x, node.position.y, node.height
        );
    }
    for exit in &layout.exits {
        println!(
            "  {:<24} exit      x {:>7.1}  y {:>8.1}",
            exit.id, exit.position.x, exit.position.y
        );
    }

    let skipped = tree.nodes.len() - layout.nodes.len();
    println!(
        "\n{} placed, {} unreachable, {} exits, {} edges",
        layout.nodes.len(),
        skipped,
        layout.exits.len(),
        layout.edges.len()
    );
}
