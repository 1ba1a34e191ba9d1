//! Medvault CLI - encrypted clinical records with role-filtered access
//!
//! This is the command-line interface for Medvault. It wires the config file,
//! secret prompt and storage backend to the core library.

mod app;
mod cli;
mod commands;
mod config;
mod output;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    let filter = EnvFilter::try_from_env("MEDVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Commands::InitConfig(args) => commands::handle_init_config(&cli, args)?,
        Commands::List(args) => commands::handle_list(&cli, args)?,
        Commands::Add(args) => commands::handle_add(&cli, args)?,
        Commands::Edit(args) => commands::handle_edit(&cli, args)?,
        Commands::Attach(args) => commands::handle_attach(&cli, args)?,
        Commands::Detach(args) => commands::handle_detach(&cli, args)?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "medvault", &mut std::io::stdout());
        }
    }

    Ok(())
}
