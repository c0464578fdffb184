use std::io::{BufRead, Write};
use std::path::Path;

use skein_core::StringHash;
use skein_engine::{EngineConfig, JsonCheckpointStore, Session, Signal};

pub fn run(
    script: &Path,
    level: Option<u32>,
    checkpoint: Option<&Path>,
    skip_to: Option<&str>,
) -> Result<(), String> {
    let graph = super::load_graph(script)?;
    let mut session = Session::new(graph, EngineConfig::default());
    if let Some(path) = checkpoint {
        session = session.with_store(Box::new(JsonCheckpointStore::new(path)));
    }

    match level {
        Some(index) => session.start_level(index),
        None => session.start(),
    }
    .map_err(|e| e.to_string())?;

    if let Some(name) = skip_to {
        let node = StringHash::hash(name);
        if !session.engine().graph().contains(node) {
            return Err(format!("unknown node: {name}"));
        }
        session.skip_to(node).map_err(|e| e.to_string())?;
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    loop {
        match session.advance().map_err(|e| e.to_string())? {
            Signal::Line { text, .. } => {
                println!("{text}");
            }
            Signal::Choices(options) => {
                if options.is_empty() {
                    return Err("no available choices; the script is stuck".into());
                }
                for (i, option) in options.iter().enumerate() {
                    println!("  {}. {}", i + 1, option.text);
                }
                let index = prompt_choice(&mut input, options.len())?;
                session.choose(index).map_err(|e| e.to_string())?;
            }
            Signal::Ended { node } => {
                let name = session
                    .engine()
                    .graph()
                    .node_name(node)
                    .unwrap_or("<unknown>");
                println!();
                println!("  The end ({name}).");
                return Ok(());
            }
        }
    }
}

/// Prompt until the player enters a number in `1..=len`, or EOF.
fn prompt_choice(input: &mut impl BufRead, len: usize) -> Result<usize, String> {
    loop {
        print!("> ");
        std::io::stdout().flush().map_err(|e| e.to_string())?;

        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(|e| e.to_string())?;
        if read == 0 {
            return Err("input closed mid-choice".into());
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=len).contains(&n) => return Ok(n - 1),
            _ => println!("  enter a number between 1 and {len}"),
        }
    }
}
