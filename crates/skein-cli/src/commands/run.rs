use std::path::Path;

use skein_engine::{AutoPlayer, EngineConfig, Session};

pub fn run(script: &Path, seed: u64, level: Option<u32>, transcript: bool) -> Result<(), String> {
    let graph = super::load_graph(script)?;
    let mut session = Session::new(graph, EngineConfig::default().with_headless(true));
    match level {
        Some(index) => session.start_level(index),
        None => session.start(),
    }
    .map_err(|e| e.to_string())?;

    let play = AutoPlayer::new(seed)
        .play(&mut session)
        .map_err(|e| e.to_string())?;

    if transcript {
        for line in &play.lines {
            println!("{line}");
        }
        println!();
    }

    let ended_at = session
        .engine()
        .graph()
        .node_name(play.ended_at)
        .unwrap_or("<unknown>")
        .to_string();
    println!("  Run complete (seed {seed}).");
    println!(
        "  {} lines, {} choices taken, ended at '{ended_at}'",
        play.lines.len(),
        play.choices_taken.len()
    );

    Ok(())
}
