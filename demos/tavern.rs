/// Tavern demo: plays the bundled Rusty Flagon tree through the preview
/// interpreter, then prints its layout and lint report.
///
/// A walk: buy a drink → loosened tongue → confront the captain → flee →
/// rumors locked behind the watchful guard → browse the shop.
///
/// Run with: cargo run --example tavern

use dialogue_graph_engine::core::diagnostics::{choice_tooltip, lint};
use dialogue_graph_engine::core::layout::layout;
use dialogue_graph_engine::core::markup::parse_markup;
use dialogue_graph_engine::core::session::{PreviewSession, Transition};
use dialogue_graph_engine::schema::tree::DialogueTree;

fn main() {
    // --- Load the bundled tree ---
    let tree = DialogueTree::load_from_file(std::path::Path::new("dialogue_data/tavern.json"))
        .expect("Failed to load tavern tree");

    let mut session = PreviewSession::builder(&tree)
        .seed_state("gold", 10)
        .seed_known_keys()
        .default_portrait("portraits/unknown.png")
        .build();

    println!("=== {} ===\n", tree.name);
    print_line(&session);

    let walk = [
        "buy_drink",
        "thanks",
        "ask_rumors",
        "find_hale",
        "bolt",
        "ask_rumors",
        "bribe",
        "never_mind",
        "browse",
    ];

    for choice_id in walk {
        show_choices(&session);
        println!("> {}", choice_id);
        match session.apply_choice(choice_id) {
            Ok(Transition::Advanced { .. }) => print_line(&session),
            Ok(Transition::Ended(event)) => {
                println!("\n*** {} ***\n", event);
                break;
            }
            Err(e) => println!("  (refused: {})\n", e),
        }
    }

    let mut flags: Vec<&String> = session.flags().iter().collect();
    flags.sort();
    println!("Flags at the end: {:?}", flags);
    println!("State at the end: {:?}\n", session.state().sorted());

    // --- Layout ---
    let placed = layout(&tree);
    println!("=== Layout ===");
    for node in &placed.nodes {
        println!(
            "  {:<12} depth {}  ({:>6.1}, {:>7.1})",
            node.id, node.depth, node.position.x, node.position.y
        );
    }
    for exit in &placed.exits {
        println!("  {:<12} exit     ({:>6.1}, {:>7.1})", exit.id, exit.position.x, exit.position.y);
    }

    // --- Tooltips and lint ---
    println!("\n=== Tooltips ===");
    for (node_id, choice) in tree.choices() {
        if let Some(tip) = choice_tooltip(choice, &tree) {
            println!("  {}/{}: {}", node_id, choice.id, tip.replace('\n', " | "));
        }
    }

    let report = lint(&tree);
    println!("\n=== Lint: {} issues ===", report.issues.len());
    for issue in &report.issues {
        println!("  {}", issue);
    }
}

fn print_line(session: &PreviewSession<'_>) {
    let Some(message) = session.transcript().last() else {
        return;
    };
    let styled: Vec<String> = parse_markup(&message.text)
        .iter()
        .map(|span| {
            if span.is_plain() {
                span.content.clone()
            } else {
                format!("*{}*", span.content)
            }
        })
        .collect();
    println!(
        "{} [{}]: {}\n",
        message.speaker,
        message.portrait.as_deref().unwrap_or("-"),
        styled.concat()
    );
}

fn show_choices(session: &PreviewSession<'_>) {
    for offered in session.offered_choices() {
        let marker = if offered.available { " " } else { "x" };
        println!("  [{}] {}", marker, offered.text);
    }
}
