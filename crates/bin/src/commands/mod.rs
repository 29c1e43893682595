//! Subcommand implementations. Each `run` returns the process exit status.

pub mod check;
pub mod diff;
pub mod get;
pub mod set;
pub mod show;

use std::fs;
use std::path::Path as FsPath;

use arbor::{NodeRef, Path};

pub type CommandResult = Result<i32, Box<dyn std::error::Error>>;

/// Read `file` as a JSON document, naming the root after the file stem.
pub fn load(file: &FsPath) -> Result<NodeRef, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(file).map_err(|e| format!("{}: {e}", file.display()))?;
    let name = file.file_stem().and_then(|stem| stem.to_str());
    let root = arbor::json::from_json(&text, 0, name)?;
    tracing::debug!(file = %file.display(), nodes = root.len(), "loaded document");
    Ok(root)
}

pub fn parse_path(text: &str) -> Result<Path, Box<dyn std::error::Error>> {
    Ok(text.parse::<Path>().map_err(arbor::Error::from)?)
}
