#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for managing arena maps and running headless matches.

mod maps;
mod scaffold;
mod settings;
mod simulate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::settings::Settings;

/// Brawl Arena map tooling.
#[derive(Debug, Parser)]
#[command(name = "brawl-arena", version, about, long_about = None)]
struct Cli {
    /// Optional settings file with [grid], [match], [storage] and [sprites] sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List stored and shipped maps
    List,
    /// Print a text preview of a map
    Show(maps::ShowArgs),
    /// Check that a map is playable
    Validate(maps::NameArgs),
    /// Print a share string for a map
    Export(maps::NameArgs),
    /// Store a map received as a share string
    Import(maps::ImportArgs),
    /// Delete a stored map
    Delete(maps::NameArgs),
    /// Author the demo maps through the editor
    Scaffold(scaffold::ScaffoldArgs),
    /// Run a headless match with scripted players
    Simulate(simulate::SimulateArgs),
}

/// Entry point for the Brawl Arena command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::List => maps::list(&settings),
        Commands::Show(args) => maps::show(&settings, &args),
        Commands::Validate(args) => maps::validate(&settings, &args),
        Commands::Export(args) => maps::export(&settings, &args),
        Commands::Import(args) => maps::import(&settings, &args),
        Commands::Delete(args) => maps::delete(&settings, &args),
        Commands::Scaffold(args) => scaffold::run(&settings, &args),
        Commands::Simulate(args) => simulate::run(&settings, &args),
    }
}
