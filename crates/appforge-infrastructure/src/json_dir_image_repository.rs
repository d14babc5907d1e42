//! JsonDirStorage-based ImageRepository implementation.
//!
//! Staged vision images: a data URL goes in, an opaque id comes out, and
//! the id resolves back to the data URL when the multimodal prompt is
//! composed.

use crate::json_dir_storage::JsonDirStorage;
use crate::paths::AppforgePaths;
use appforge_core::error::{AppforgeError, Result};
use appforge_core::repository::ImageRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct StagedImage {
    id: String,
    data_url: String,
    created_at: String,
}

pub struct JsonDirImageRepository {
    storage: JsonDirStorage,
}

impl JsonDirImageRepository {
    /// Creates a repository at the default location.
    pub async fn default() -> Result<Self> {
        Self::new(None).await
    }

    /// Creates a repository under a custom base directory (for testing).
    pub async fn new(base_dir: Option<&Path>) -> Result<Self> {
        let dir = AppforgePaths::new(base_dir)
            .images_dir()
            .map_err(|e| AppforgeError::io(e.to_string()))?;
        Ok(Self {
            storage: JsonDirStorage::open(dir).await?,
        })
    }
}

#[async_trait]
impl ImageRepository for JsonDirImageRepository {
    async fn stage(&self, data_url: &str) -> Result<String> {
        let record = StagedImage {
            id: uuid::Uuid::new_v4().to_string(),
            data_url: data_url.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.storage.save(&record.id, &record).await?;
        Ok(record.id)
    }

    async fn resolve(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .storage
            .load::<StagedImage>(id)
            .await?
            .map(|record| record.data_url))
    }
}
