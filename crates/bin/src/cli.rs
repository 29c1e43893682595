//! CLI argument definitions for the Arbor binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Aligned text for people
    Human,
    /// One JSON document per command
    Json,
}

/// Inspect and edit JSON documents as Arbor trees
#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(about = "Arbor: inspect and edit JSON documents as value trees")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "human", env = "ARBOR_FORMAT")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a document, or the subtree at a path
    Show(ShowArgs),
    /// Print the value at a path
    Get(GetArgs),
    /// Set the value at a path and write the document back
    Set(SetArgs),
    /// List the keys where two documents differ
    Diff(DiffArgs),
    /// Verify that every node is held by its parent
    Check(CheckArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// JSON document to read
    pub file: PathBuf,

    /// Only show the subtree at this path (e.g. `db::hosts[0]`)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// JSON document to read
    pub file: PathBuf,

    /// Path of the value
    pub path: String,
}

/// Arguments for the set command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// JSON document to edit
    pub file: PathBuf,

    /// Path of the value; missing nodes are created
    pub path: String,

    /// New value, parsed as a JSON scalar and otherwise taken as a string
    pub value: String,

    /// Write the result here instead of back to `file`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the diff command
#[derive(clap::Args, Debug)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
}

/// Arguments for the check command
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// JSON document to check
    pub file: PathBuf,
}
