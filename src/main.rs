use anyhow::Result;
use clap::Parser;

use waypoint::cli::{args::Cli, context::init_tracing, run};
use waypoint::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.clone())?;
    init_tracing(&loaded.config.global.logging)?;
    run(cli, loaded).await
}
