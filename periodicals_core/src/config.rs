use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_PERIODICALS_CONFIG: &str = include_str!("data/periodicals_config.json");

/// Environment variable naming an override config file.
pub const CONFIG_PATH_ENV: &str = "PERIODICALS_CONFIG_PATH";
/// Environment variable holding the player id sent with every request.
pub const USER_ID_ENV: &str = "EI_USERID";

/// Settings shared by every component of a run.
///
/// Built once at startup and handed out behind an [`Arc`]; nothing mutates it
/// after loading.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeriodicalsConfig {
    endpoints: EndpointConfig,
    client: ClientConfig,
    paths: PathsConfig,
    #[serde(skip)]
    user_id: String,
}

impl PeriodicalsConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_PERIODICALS_CONFIG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_paths(mut self, paths: PathsConfig) -> Self {
        self.paths = paths;
        self
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse periodicals config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read periodicals config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    periodicals_url: String,
    season_info_url: String,
    request_timeout_secs: u64,
}

impl EndpointConfig {
    pub fn new(periodicals_url: impl Into<String>, season_info_url: impl Into<String>) -> Self {
        Self {
            periodicals_url: periodicals_url.into(),
            season_info_url: season_info_url.into(),
            ..Self::default()
        }
    }

    pub fn periodicals_url(&self) -> &str {
        &self.periodicals_url
    }

    pub fn season_info_url(&self) -> &str {
        &self.season_info_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            periodicals_url: "https://www.auxbrain.com/ei/get_periodicals".to_string(),
            season_info_url: "https://www.auxbrain.com/ei_ctx/get_season_infos_v2".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Client metadata the service expects in `BasicRequestInfo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    current_client_version: u32,
    client_version: u32,
    version: String,
    build: String,
    platform: String,
}

impl ClientConfig {
    pub fn current_client_version(&self) -> u32 {
        self.current_client_version
    }

    pub fn client_version(&self) -> u32 {
        self.client_version
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn build(&self) -> &str {
        &self.build
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            current_client_version: 999,
            client_version: 67,
            version: "1.33.1".to_string(),
            build: "111291".to_string(),
            platform: "IOS".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    event_file: PathBuf,
    contract_file: PathBuf,
    season_contract_file: PathBuf,
    contract_season_file: PathBuf,
    custom_egg_file: PathBuf,
    egg_icon_dir: PathBuf,
}

impl PathsConfig {
    /// Resolve every relative path against `root`.
    pub fn rooted_at(&self, root: &Path) -> Self {
        let join = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            }
        };
        Self {
            event_file: join(&self.event_file),
            contract_file: join(&self.contract_file),
            season_contract_file: join(&self.season_contract_file),
            contract_season_file: join(&self.contract_season_file),
            custom_egg_file: join(&self.custom_egg_file),
            egg_icon_dir: join(&self.egg_icon_dir),
        }
    }

    pub fn event_file(&self) -> &Path {
        &self.event_file
    }

    pub fn contract_file(&self) -> &Path {
        &self.contract_file
    }

    pub fn season_contract_file(&self) -> &Path {
        &self.season_contract_file
    }

    pub fn contract_season_file(&self) -> &Path {
        &self.contract_season_file
    }

    pub fn custom_egg_file(&self) -> &Path {
        &self.custom_egg_file
    }

    pub fn egg_icon_dir(&self) -> &Path {
        &self.egg_icon_dir
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            event_file: PathBuf::from("data/events.json"),
            contract_file: PathBuf::from("data/contracts.json"),
            season_contract_file: PathBuf::from("data/seasoncontracts.json"),
            contract_season_file: PathBuf::from("data/contractseasons.json"),
            custom_egg_file: PathBuf::from("data/customeggs.json"),
            egg_icon_dir: PathBuf::from("."),
        }
    }
}

/// Load the run configuration: override file when `PERIODICALS_CONFIG_PATH` is
/// set and readable, built-in defaults otherwise, plus the user id from
/// `EI_USERID`.
pub fn load_periodicals_config_from_env() -> Result<Arc<PeriodicalsConfig>, ConfigError> {
    let override_path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);

    let mut loaded = None;
    if let Some(path) = override_path {
        match PeriodicalsConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "periodicals::config",
                    path = %path.display(),
                    "periodicals_config.loaded=file"
                );
                loaded = Some(config);
            }
            Err(err) => {
                tracing::warn!(
                    target: "periodicals::config",
                    path = %path.display(),
                    error = %err,
                    "periodicals_config.load_failed"
                );
            }
        }
    }

    let config = match loaded {
        Some(config) => config,
        None => {
            tracing::info!(
                target: "periodicals::config",
                "periodicals_config.loaded=builtin"
            );
            PeriodicalsConfig::builtin()?
        }
    };

    let user_id = env::var(USER_ID_ENV).unwrap_or_default();
    if user_id.is_empty() {
        tracing::warn!(
            target: "periodicals::config",
            env = USER_ID_ENV,
            "periodicals_config.user_id_missing"
        );
    }

    Ok(Arc::new(config.with_user_id(user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_defaults() {
        let config = PeriodicalsConfig::builtin().expect("builtin config should parse");
        assert_eq!(config.client().current_client_version(), 999);
        assert_eq!(config.client().platform(), "IOS");
        assert_eq!(
            config.paths().contract_file(),
            Path::new("data/contracts.json")
        );
        assert_eq!(
            config.endpoints().periodicals_url(),
            EndpointConfig::default().periodicals_url()
        );
        assert!(config.user_id().is_empty());
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let config = PeriodicalsConfig::from_json_str(
            r#"{ "client": { "version": "1.34.0" }, "paths": { "egg_icon_dir": "icons" } }"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.client().version(), "1.34.0");
        assert_eq!(config.client().build(), "111291");
        assert_eq!(config.paths().egg_icon_dir(), Path::new("icons"));
        assert_eq!(config.paths().event_file(), Path::new("data/events.json"));
    }

    #[test]
    fn rooted_paths_keep_absolute_entries() {
        let root = Path::new("/srv/catalog");
        let paths = PathsConfig::default().rooted_at(root);
        assert_eq!(paths.event_file(), Path::new("/srv/catalog/data/events.json"));
        assert_eq!(paths.rooted_at(Path::new("/elsewhere")).event_file(), paths.event_file());
    }

    #[test]
    fn missing_override_file_is_a_read_error() {
        let err = PeriodicalsConfig::from_file(Path::new("/nonexistent/periodicals.json"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }
}
