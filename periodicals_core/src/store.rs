//! JSON snapshot files backing each catalog collection.
//!
//! Collections are always read and rewritten whole. Writes land in a temp
//! file beside the destination and are renamed into place, so a reader never
//! observes a half-written catalog.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use periodicals_runtime::{decode_collection_json, encode_collection_json};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Mode for newly created catalog files; other users must be able to read them.
#[cfg(unix)]
pub const CATALOG_FILE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize collection for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read a persisted collection. A missing file is an empty collection.
pub fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(
                target: "periodicals::store",
                path = %path.display(),
                "collection.missing"
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    decode_collection_json(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace a persisted collection.
pub fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let text = encode_collection_json(records).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let write_err = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(text.as_bytes()).map_err(write_err)?;
    temp.flush().map_err(write_err)?;
    #[cfg(unix)]
    temp.as_file()
        .set_permissions(catalog_permissions(path))
        .map_err(write_err)?;
    temp.persist(path).map_err(|err| write_err(err.error))?;

    tracing::debug!(
        target: "periodicals::store",
        path = %path.display(),
        records = records.len(),
        "collection.written"
    );
    Ok(())
}

/// Permissions of the file being replaced, or [`CATALOG_FILE_MODE`] for a new one.
#[cfg(unix)]
fn catalog_permissions(path: &Path) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|metadata| metadata.permissions())
        .unwrap_or_else(|_| fs::Permissions::from_mode(CATALOG_FILE_MODE))
}
