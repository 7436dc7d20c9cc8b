//! Waymark CLI Application
//!
//! Command-line driver for authoring plans step by step and publishing them.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use waymark_core::SqliteGatewayBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        owner,
        no_color,
        command,
    } = Args::parse();

    let gateway = SqliteGatewayBuilder::new()
        .with_database_path(database_file)
        .with_owner(owner)
        .build()
        .await
        .context("Failed to open plan database")?;

    info!("Waymark started for owner '{}'", gateway.owner());
    let cli = Cli::new(gateway, TerminalRenderer::new(!no_color));

    match command {
        Commands::Plan { command } => cli.handle_plan_command(command).await,
        Commands::Step { command } => cli.handle_step_command(command).await,
    }
}
