//! Folio CLI - personal digital library catalog.
//!
//! Provides commands for:
//! - `serve`: Start the catalog server (and the auto-add watcher)
//! - `add`: Import EPUB files into the library
//! - `remove`: Delete books by id
//! - `feeds`: List feed definitions

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AddArgs, FeedsArgs, RemoveArgs, ServeArgs};
use error::CliError;
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Folio - personal digital library catalog.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the catalog server.
    Serve(ServeArgs),
    /// Import EPUB files.
    Add(AddArgs),
    /// Remove books by id.
    Remove(RemoveArgs),
    /// List feed definitions.
    Feeds(FeedsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Serve(args) => args.library.verbose,
        Commands::Add(args) => args.library.verbose,
        Commands::Remove(args) => args.library.verbose,
        Commands::Feeds(args) => args.library.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute(VERSION))),
        Commands::Add(args) => args.execute(),
        Commands::Remove(args) => args.execute(),
        Commands::Feeds(args) => args.execute(),
    };

    if let Err(err) = result {
        output.fatal(&err);
        std::process::exit(1);
    }
}
