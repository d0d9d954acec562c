use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use periodicals_core::{
    load_periodicals_config_from_env, parse_commands, run_commands, RemoteFetcher,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fetch the periodicals snapshot and merge it into the local catalogs"
)]
struct Cli {
    /// Workflows to run: events, contracts, customeggs, download-customeggs, contractseasons.
    #[arg(required = true)]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let commands = parse_commands(&cli.commands);
    if commands.is_empty() {
        warn!(target: "periodicals::cli", "no recognised commands; nothing to do");
        return Ok(());
    }

    let config = load_periodicals_config_from_env().context("loading configuration")?;
    let fetcher = RemoteFetcher::new(Arc::clone(&config)).context("building HTTP client")?;
    let snapshot = fetcher
        .fetch_periodicals()
        .await
        .context("fetching periodicals snapshot")?;

    let outcomes = run_commands(config, fetcher, Arc::new(snapshot), &commands).await;
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        target: "periodicals::cli",
        commands = outcomes.len(),
        failed,
        "run.completed"
    );
    Ok(())
}
