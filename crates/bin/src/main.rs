use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};

fn main() {
    // Initialize tracing; logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arbor=info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let result = match &cli.command {
        Commands::Show(args) => commands::show::run(args, format),
        Commands::Get(args) => commands::get::run(args, format),
        Commands::Set(args) => commands::set::run(args, format),
        Commands::Diff(args) => commands::diff::run(args, format),
        Commands::Check(args) => commands::check::run(args, format),
    };

    match result {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
