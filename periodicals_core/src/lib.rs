//! Ingestion and merge pipeline for the periodicals snapshot.
//!
//! A run fetches one [`PeriodicalsResponse`] snapshot through
//! [`RemoteFetcher`], then [`run_commands`] reconciles it with the JSON
//! catalogs on disk, one workflow per requested [`Command`].
//!
//! [`PeriodicalsResponse`]: periodicals_runtime::proto::PeriodicalsResponse

pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod icons;
pub mod merge;
pub mod metrics;
pub mod store;

pub use config::{
    load_periodicals_config_from_env, ClientConfig, ConfigError, EndpointConfig, PathsConfig,
    PeriodicalsConfig,
};
pub use dispatch::{
    parse_commands, run_commands, Command, CommandError, CommandOutcome, CommandReport,
    UnknownCommand,
};
pub use fetch::{FetchError, RemoteFetcher};
pub use icons::{
    download_custom_egg_icons, plan_icon_downloads, IconDownload, IconError, IconTarget,
};
pub use merge::contracts::{merge_contracts, update_contracts, ContractMerge};
pub use merge::custom_eggs::{encode_custom_eggs, icon_file_name, update_custom_eggs};
pub use merge::events::{merge_events, update_events};
pub use merge::seasons::{backfill_season_start_times, merge_seasons, update_contract_seasons};
pub use merge::{MergeError, Retained};
pub use metrics::{Collection, MergeSummary};
pub use store::{read_collection, write_collection, StoreError};
