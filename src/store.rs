//! Per-source persistent store of previously collected items.
//!
//! Each source owns one JSON file holding every item it has ever collected,
//! in discovery order. The file is read once when a source starts and
//! rewritten in full once when it finishes. There is no locking: exactly one
//! process may use a given store file at a time.

use crate::error::{Error, Result};
use crate::models::CollectedItem;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Handle to one source's store file.
#[derive(Debug, Clone)]
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every stored item.
    ///
    /// A missing file is an empty store. A file that exists but is not a
    /// JSON array of items is [`Error::StorageCorrupt`]; one that cannot be
    /// read at all is [`Error::StorageRead`].
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<CollectedItem>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store file absent; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::StorageRead {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let items: Vec<CollectedItem> =
            serde_json::from_slice(&raw).map_err(|e| Error::StorageCorrupt {
                path: self.path.clone(),
                source: e,
            })?;
        debug!(count = items.len(), "Loaded store");
        Ok(items)
    }

    /// Overwrite the store file with `items`.
    ///
    /// Parent directories are created as needed. Failures are returned as
    /// [`Error::StorageWrite`] and are not retried.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = items.len()))]
    pub async fn save(&self, items: &[CollectedItem]) -> Result<()> {
        let write_err = |source| Error::StorageWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let json = serde_json::to_vec_pretty(items)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        fs::write(&self.path, json).await.map_err(write_err)?;
        info!(count = items.len(), "Saved store");
        Ok(())
    }
}
