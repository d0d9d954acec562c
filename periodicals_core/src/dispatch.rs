//! Runs one workflow per requested command over a shared snapshot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use periodicals_runtime::proto::{Contract, CustomEgg, PeriodicalsResponse};
use thiserror::Error;

use crate::config::PeriodicalsConfig;
use crate::fetch::{FetchError, RemoteFetcher};
use crate::icons::{download_custom_egg_icons, IconDownload};
use crate::merge::{
    contracts::update_contracts, custom_eggs::update_custom_eggs, events::update_events,
    seasons::update_contract_seasons, unix_now, MergeError,
};
use crate::metrics::MergeSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Events,
    Contracts,
    CustomEggs,
    DownloadCustomEggs,
    ContractSeasons,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Events,
        Command::Contracts,
        Command::CustomEggs,
        Command::DownloadCustomEggs,
        Command::ContractSeasons,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Command::Events => "events",
            Command::Contracts => "contracts",
            Command::CustomEggs => "customeggs",
            Command::DownloadCustomEggs => "download-customeggs",
            Command::ContractSeasons => "contractseasons",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.token() == token)
            .ok_or_else(|| UnknownCommand(token.to_string()))
    }
}

/// Parse command tokens, logging and skipping unknown ones.
///
/// Repeated tokens run once; two workflows never write the same file in one run.
pub fn parse_commands<I, S>(tokens: I) -> Vec<Command>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut commands = Vec::new();
    for token in tokens {
        match token.as_ref().parse::<Command>() {
            Ok(command) if commands.contains(&command) => {
                tracing::warn!(
                    target: "periodicals::dispatch",
                    %command,
                    "command.ignored=duplicate"
                );
            }
            Ok(command) => commands.push(command),
            Err(err) => tracing::warn!(
                target: "periodicals::dispatch",
                token = token.as_ref(),
                "{err}"
            ),
        }
    }
    commands
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("command task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub enum CommandReport {
    Merged(MergeSummary),
    Icons(Vec<IconDownload>),
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub command: Command,
    pub result: Result<CommandReport, CommandError>,
}

/// Run every command on its own task against the shared snapshot.
///
/// A failing command is logged and reported in its outcome; the others run to
/// completion regardless. Outcomes are returned in command order.
pub async fn run_commands(
    config: Arc<PeriodicalsConfig>,
    fetcher: RemoteFetcher,
    snapshot: Arc<PeriodicalsResponse>,
    commands: &[Command],
) -> Vec<CommandOutcome> {
    let handles: Vec<_> = commands
        .iter()
        .map(|&command| {
            let config = Arc::clone(&config);
            let fetcher = fetcher.clone();
            let snapshot = Arc::clone(&snapshot);
            let handle =
                tokio::spawn(async move { run_command(config, fetcher, snapshot, command).await });
            (command, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (command, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(CommandError::from(err)),
        };
        match &result {
            Ok(CommandReport::Merged(summary)) => summary.log(),
            Ok(CommandReport::Icons(downloads)) => tracing::info!(
                target: "periodicals::dispatch",
                %command,
                attempted = downloads.len(),
                saved = downloads.iter().filter(|d| d.result.is_ok()).count(),
                "icons.completed"
            ),
            Err(err) => tracing::error!(
                target: "periodicals::dispatch",
                %command,
                error = %err,
                "command.failed"
            ),
        }
        outcomes.push(CommandOutcome { command, result });
    }
    outcomes
}

async fn run_command(
    config: Arc<PeriodicalsConfig>,
    fetcher: RemoteFetcher,
    snapshot: Arc<PeriodicalsResponse>,
    command: Command,
) -> Result<CommandReport, CommandError> {
    tracing::debug!(target: "periodicals::dispatch", %command, "command.started");
    match command {
        Command::Events => {
            let summary = tokio::task::spawn_blocking(move || {
                let events = snapshot
                    .events
                    .as_ref()
                    .map(|current| current.events.as_slice())
                    .unwrap_or_default();
                update_events(config.paths(), events)
            })
            .await??;
            Ok(CommandReport::Merged(summary))
        }
        Command::Contracts => {
            let summary = tokio::task::spawn_blocking(move || {
                let current_season = snapshot
                    .contracts
                    .as_ref()
                    .and_then(|contracts| contracts.current_season.as_ref())
                    .map(|season| season.id())
                    .unwrap_or_default();
                update_contracts(
                    config.paths(),
                    active_contracts(&snapshot),
                    current_season,
                    unix_now(),
                )
            })
            .await??;
            Ok(CommandReport::Merged(summary))
        }
        Command::CustomEggs => {
            let summary = tokio::task::spawn_blocking(move || {
                update_custom_eggs(config.paths(), custom_eggs(&snapshot))
            })
            .await??;
            Ok(CommandReport::Merged(summary))
        }
        Command::DownloadCustomEggs => {
            let eggs = custom_eggs(&snapshot);
            if eggs.is_empty() {
                tracing::error!(target: "periodicals::dispatch", "custom_eggs.missing");
            }
            let downloads =
                download_custom_egg_icons(&fetcher, eggs, config.paths().egg_icon_dir()).await;
            Ok(CommandReport::Icons(downloads))
        }
        Command::ContractSeasons => {
            let infos = fetcher.fetch_season_infos().await?;
            let summary = tokio::task::spawn_blocking(move || {
                update_contract_seasons(config.paths(), infos)
            })
            .await??;
            Ok(CommandReport::Merged(summary))
        }
    }
}

fn active_contracts(snapshot: &PeriodicalsResponse) -> &[Contract] {
    snapshot
        .contracts
        .as_ref()
        .map(|contracts| contracts.contracts.as_slice())
        .unwrap_or_default()
}

fn custom_eggs(snapshot: &PeriodicalsResponse) -> &[CustomEgg] {
    snapshot
        .contracts
        .as_ref()
        .map(|contracts| contracts.custom_eggs.as_slice())
        .unwrap_or_default()
}
