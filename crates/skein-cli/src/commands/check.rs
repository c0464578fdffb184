use std::path::Path;

use skein_engine::{EngineConfig, Step};

pub fn run(script: &Path) -> Result<(), String> {
    let graph = super::load_graph(script)?;

    // Load validation already rejected collisions, duplicates, and
    // dangling targets; oversized choice lists only degrade at play
    // time, so surface them here as warnings.
    let max_choices = EngineConfig::default().max_choices;
    let mut warnings = 0;
    for node in graph.nodes() {
        for step in &node.body {
            if let Step::Choices(options) = step {
                if options.len() > max_choices {
                    eprintln!(
                        "  warning: node '{}' has {} choice options (display shows {})",
                        node.name,
                        options.len(),
                        max_choices
                    );
                    warnings += 1;
                }
            }
        }
    }

    println!("  All checks passed for '{}'.", graph.title());
    println!(
        "  {} nodes, {} levels, {} stats",
        graph.node_count(),
        graph.levels().len(),
        graph.stat_catalog().len()
    );
    if warnings > 0 {
        println!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" }
        );
    }

    Ok(())
}
