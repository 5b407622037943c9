/// Preview: interactive play-through shell for dialogue trees.
///
/// Usage: preview <tree.json|tree.ron> [--seed-known] [--state key=value]... [--portrait <asset>]
///
/// Commands:
///   choices              : list choices at the current node
///   choose <n>           : take choice n (1-based)
///   flags                : show active flags and state
///   flag <name>          : toggle a flag
///   set <key> <value>    : set a state value
///   transcript           : print the conversation so far
///   reset                : restart from the start node
///   auto <n> [seed]      : random walk of up to n choices, then coverage
///   help                 : list commands
///   quit                 : exit

use dialogue_graph_engine::core::session::{
    PreviewSession, SessionConfig, SessionState, SessionStatus, Transition,
};
use dialogue_graph_engine::schema::tree::DialogueTree;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let tree_path = &args[1];
    let mut seed_known = false;
    let mut seeds: Vec<(String, i64)> = Vec::new();
    let mut portrait = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed-known" => seed_known = true,
            "--state" if i + 1 < args.len() => {
                i += 1;
                match parse_assignment(&args[i]) {
                    Some(pair) => seeds.push(pair),
                    None => {
                        eprintln!("Invalid --state value '{}', expected key=value", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            "--portrait" if i + 1 < args.len() => {
                i += 1;
                portrait = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let tree = match DialogueTree::load_from_file(Path::new(tree_path)) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("ERROR: Failed to load tree '{}': {}", tree_path, e);
            std::process::exit(1);
        }
    };

    let mut builder = PreviewSession::builder(&tree);
    for (key, value) in &seeds {
        builder = builder.seed_state(key, *value);
    }
    if seed_known {
        builder = builder.seed_known_keys();
    }
    if let Some(ref asset) = portrait {
        builder = builder.default_portrait(asset);
    }
    let mut session = builder.build();

    println!("Loaded '{}' ({} nodes)", tree.name, tree.nodes.len());
    println!("Type 'help' for commands.\n");
    print_latest(&session);
    print_choices(&session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "choices" | "c" => print_choices(&session),
            "choose" => {
                let index = match parts.get(1).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n > 0 => n - 1,
                    _ => {
                        println!("Usage: choose <n>");
                        continue;
                    }
                };
                match session.choose(index) {
                    Ok(Transition::Advanced { .. }) => {
                        print_latest(&session);
                        print_choices(&session);
                    }
                    Ok(Transition::Ended(event)) => println!("\n*** Conversation ended: {} ***\n", event),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "flags" => print_flags(&session),
            "flag" => {
                let Some(name) = parts.get(1) else {
                    println!("Usage: flag <name>");
                    continue;
                };
                let now_set = session.toggle_flag(name);
                println!("Flag '{}' {}", name, if now_set { "set" } else { "cleared" });
            }
            "set" => {
                let value = parts.get(2).and_then(|v| v.parse::<i64>().ok());
                match (parts.get(1), value) {
                    (Some(key), Some(value)) => {
                        session.set_state(key, value);
                        println!("{} = {}", key, value);
                    }
                    _ => println!("Usage: set <key> <value>"),
                }
            }
            "transcript" | "t" => {
                for message in session.transcript() {
                    if let Some(ref choice) = message.via_choice {
                        println!("  > {}", choice);
                    }
                    println!("{}: {}", message.speaker, message.text);
                }
            }
            "reset" => {
                session.reset();
                println!("Session reset.\n");
                print_latest(&session);
                print_choices(&session);
            }
            "auto" => {
                let steps: usize = match parts.get(1).and_then(|n| n.parse().ok()) {
                    Some(n) if n > 0 => n,
                    _ => {
                        println!("Usage: auto <n> [seed]");
                        continue;
                    }
                };
                let seed: u64 = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(42);
                random_walk(&tree, session.config().clone(), session.snapshot().clone(), steps, seed);
            }
            _ => println!("Unknown command '{}'. Type 'help' for commands.", cmd),
        }
    }
}

fn parse_assignment(raw: &str) -> Option<(String, i64)> {
    let (key, value) = raw.split_once('=')?;
    Some((key.trim().to_string(), value.trim().parse().ok()?))
}

/// Walk from the current session state by picking random available
/// choices. Does not touch the interactive session.
fn random_walk(
    tree: &DialogueTree,
    config: SessionConfig,
    snapshot: SessionState,
    steps: usize,
    seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = PreviewSession::resume(tree, config, snapshot);
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(session.current_node_id().to_string());

    println!("\n=== Random walk: up to {} choices (seed {}) ===\n", steps, seed);

    let mut taken = 0;
    while taken < steps && !session.is_ended() {
        let available: Vec<usize> = session
            .offered_choices()
            .iter()
            .filter(|c| c.available)
            .map(|c| c.index)
            .collect();
        let Some(&index) = available.choose(&mut rng) else {
            println!("  (no available choices at '{}')", session.current_node_id());
            break;
        };

        match session.choose(index) {
            Ok(Transition::Advanced { node_id }) => {
                if let Some(message) = session.transcript().last() {
                    println!(
                        "  {} > {}: {}",
                        message.via_choice.as_deref().unwrap_or(""),
                        message.speaker,
                        message.text
                    );
                }
                visited.insert(node_id);
            }
            Ok(Transition::Ended(event)) => println!("  ended: {}", event),
            Err(e) => {
                println!("  ERROR: {}", e);
                break;
            }
        }
        taken += 1;
    }

    let mut unvisited: Vec<&str> = tree
        .nodes
        .keys()
        .map(|k| k.as_str())
        .filter(|k| !visited.contains(*k))
        .collect();
    unvisited.sort_unstable();

    println!(
        "\nTook {} choices, visited {}/{} nodes",
        taken,
        visited.len(),
        tree.nodes.len()
    );
    if !unvisited.is_empty() {
        println!("Not visited: {}", unvisited.join(", "));
    }
    println!();
}

fn print_latest(session: &PreviewSession<'_>) {
    match session.transcript().last() {
        Some(message) => {
            let emotion = message.emotion.as_deref().unwrap_or("-");
            let portrait = message.portrait.as_deref().unwrap_or("no portrait");
            println!("[{}] ({}, {})", message.node_id, emotion, portrait);
            println!("{}: {}\n", message.speaker, message.text);
        }
        None => println!("(no lines)"),
    }
    if let SessionStatus::Ended(event) = session.status() {
        println!("*** Conversation ended: {} ***\n", event);
    }
}

fn print_choices(session: &PreviewSession<'_>) {
    let offered = session.offered_choices();
    if offered.is_empty() {
        if !session.is_ended() {
            println!("(no choices; type 'reset' to start over)\n");
        }
        return;
    }
    for choice in &offered {
        let mut line = format!("  {}. {}", choice.index + 1, choice.text);
        if let Some(status) = choice.choice.exit_status() {
            line.push_str(&format!("  [exit: {}]", status));
        } else if choice.dangling {
            line.push_str("  [missing target]");
        }
        if !choice.available {
            line.push_str("  [locked]");
        }
        println!("{}", line);
        if let Some(ref reason) = choice.locked_reason {
            for reason_line in reason.lines() {
                println!("       {}", reason_line);
            }
        }
    }
    println!();
}

fn print_flags(session: &PreviewSession<'_>) {
    let mut flags: Vec<&String> = session.flags().iter().collect();
    flags.sort();
    if flags.is_empty() {
        println!("Flags: (none)");
    } else {
        println!("Flags: {}", flags.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", "));
    }
    let state = session.state().sorted();
    if state.is_empty() {
        println!("State: (empty)");
    } else {
        for (key, value) in state {
            println!("  {} = {}", key, value);
        }
    }
}

fn print_usage() {
    println!("Usage: preview <tree.json|tree.ron> [--seed-known] [--state key=value]... [--portrait <asset>]");
}

fn print_help() {
    println!("Commands:");
    println!("  choices               — list choices at the current node");
    println!("  choose <n>            — take choice n (1-based)");
    println!("  flags                 — show active flags and state");
    println!("  flag <name>           — toggle a flag");
    println!("  set <key> <value>     — set a state value");
    println!("  transcript            — print the conversation so far");
    println!("  reset                 — restart from the start node");
    println!("  auto <n> [seed]       — random walk of up to n choices, then coverage");
    println!("  help                  — this list");
    println!("  quit                  — exit");
}
