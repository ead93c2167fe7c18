//! Entry point for the Umbra CLI, a renaming obfuscator for managed
//! bytecode modules.
//!
//! The CLI parses command-line arguments and dispatches to subcommands for
//! obfuscating a whole project or inspecting a single module fixture. It
//! initializes logging and handles the main execution flow.

use clap::Parser;

mod commands;

/// Command-line interface for Umbra.
///
/// Umbra rewrites the names of types, members, and namespaces in compiled
/// managed modules, propagates every rename across the module set, and can
/// replace literal strings with a runtime-decoded blob.
#[derive(Debug, Parser)]
#[command(name = "umbra")]
#[command(about = "Umbra: managed module renaming obfuscator")]
struct Cli {
    #[command(subcommand)]
    command: commands::Cmd,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    cli.command.execute()
}
