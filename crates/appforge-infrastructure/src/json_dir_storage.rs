//! One-JSON-file-per-record directory storage.
//!
//! The storage primitive behind the publish, image, and session
//! repositories: each record lives in `<dir>/<id>.json`.

use appforge_core::error::{AppforgeError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct JsonDirStorage {
    dir: PathBuf,
}

impl JsonDirStorage {
    /// Opens (creating if needed) a storage directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppforgeError::io(format!("failed to create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persists one record.
    pub async fn save<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.record_path(id), json)
            .await
            .map_err(|e| AppforgeError::data_access(format!("failed to write {id}: {e}")))
    }

    /// Loads one record; `Ok(None)` if the file does not exist.
    pub async fn load<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        match fs::read_to_string(self.record_path(id)).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppforgeError::data_access(format!(
                "failed to read {id}: {e}"
            ))),
        }
    }

    /// Loads every record in the directory, skipping non-JSON entries.
    pub async fn load_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| AppforgeError::data_access(format!("failed to list records: {e}")))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppforgeError::data_access(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path).await {
                Ok(json) => match serde_json::from_str(&json) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }
        Ok(records)
    }

    /// Removes one record; missing files are not an error.
    pub async fn delete(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppforgeError::data_access(format!(
                "failed to delete {id}: {e}"
            ))),
        }
    }

    /// The backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
