pub mod check;
pub mod play;
pub mod run;

use std::path::Path;

use skein_engine::{GraphAsset, ScriptGraph};

/// Load and validate a script asset from disk.
fn load_graph(script: &Path) -> Result<ScriptGraph, String> {
    let text = std::fs::read_to_string(script)
        .map_err(|e| format!("cannot read {}: {e}", script.display()))?;
    let asset = GraphAsset::from_json(&text).map_err(|e| e.to_string())?;
    ScriptGraph::from_asset(asset).map_err(|e| e.to_string())
}
