use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use periodicals_runtime::proto::CustomEgg;
use thiserror::Error;

use crate::fetch::{FetchError, RemoteFetcher};
use crate::merge::custom_eggs::icon_file_name;

#[derive(Debug, Error)]
pub enum IconError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to save icon to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("icon download task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of downloading one egg icon.
#[derive(Debug)]
pub struct IconDownload {
    pub name: String,
    pub path: PathBuf,
    pub result: Result<usize, IconError>,
}

/// An icon to fetch and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconTarget {
    pub name: String,
    pub url: String,
    pub path: PathBuf,
}

/// Select the eggs whose icon should be downloaded into `dir`.
///
/// Eggs without an icon url are skipped. When two names map to the same file,
/// only the first egg keeps it, so no two downloads write one path.
pub fn plan_icon_downloads(eggs: &[CustomEgg], dir: &Path) -> Vec<IconTarget> {
    let mut claimed = HashSet::new();
    let mut targets = Vec::new();
    for egg in eggs {
        let url = match egg.icon.as_ref().map(|icon| icon.url()) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => continue,
        };
        let name = egg.name().to_string();
        let path = dir.join(icon_file_name(&name));
        if !claimed.insert(path.clone()) {
            tracing::warn!(
                target: "periodicals::icons",
                egg = %name,
                path = %path.display(),
                "icon.skipped=duplicate_path"
            );
            continue;
        }
        targets.push(IconTarget { name, url, path });
    }
    targets
}

/// Download the icon of every egg that has one into `dir`.
///
/// Each icon is fetched on its own task. Failures are reported per egg and
/// never stop the rest of the batch; results come back in input order.
pub async fn download_custom_egg_icons(
    fetcher: &RemoteFetcher,
    eggs: &[CustomEgg],
    dir: &Path,
) -> Vec<IconDownload> {
    let mut pending = Vec::new();
    for IconTarget { name, url, path } in plan_icon_downloads(eggs, dir) {
        tracing::info!(
            target: "periodicals::icons",
            egg = %name,
            path = %path.display(),
            "icon.downloading"
        );

        let fetcher = fetcher.clone();
        let target = path.clone();
        let handle = tokio::spawn(async move { save_icon(&fetcher, &url, &target).await });
        pending.push((name, path, handle));
    }

    let mut downloads = Vec::with_capacity(pending.len());
    for (name, path, handle) in pending {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(IconError::from(err)),
        };
        match &result {
            Ok(bytes) => tracing::info!(
                target: "periodicals::icons",
                egg = %name,
                bytes,
                "icon.saved"
            ),
            Err(err) => tracing::warn!(
                target: "periodicals::icons",
                egg = %name,
                error = %err,
                "icon.failed"
            ),
        }
        downloads.push(IconDownload { name, path, result });
    }
    downloads
}

async fn save_icon(fetcher: &RemoteFetcher, url: &str, path: &Path) -> Result<usize, IconError> {
    let bytes = fetcher.fetch_bytes(url).await?;
    let write_err = |source| IconError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(path, &bytes).await.map_err(write_err)?;
    Ok(bytes.len())
}
