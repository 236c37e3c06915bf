mod auth;
mod cli;
mod config;
mod differ;
mod error;
mod graph;
mod jobs;
mod orchestrator;
mod output;
mod providers;
mod rendering;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting cidiff - CI/CD Pipeline Graph Differ");
    cli.execute().await?;

    Ok(())
}
