//! JsonDirStorage-based PublishRepository implementation.
//!
//! Directory structure:
//! ```text
//! ~/.config/appforge/published/
//! ├── <app-uuid-1>.json
//! └── <app-uuid-2>.json
//! ```

use crate::json_dir_storage::JsonDirStorage;
use crate::paths::AppforgePaths;
use appforge_core::error::{AppforgeError, Result};
use appforge_core::repository::{PublishRepository, PublishedApp};
use async_trait::async_trait;
use std::path::Path;

pub struct JsonDirPublishRepository {
    storage: JsonDirStorage,
}

impl JsonDirPublishRepository {
    /// Creates a repository at the default location.
    pub async fn default() -> Result<Self> {
        Self::new(None).await
    }

    /// Creates a repository under a custom base directory (for testing).
    pub async fn new(base_dir: Option<&Path>) -> Result<Self> {
        let dir = AppforgePaths::new(base_dir)
            .published_dir()
            .map_err(|e| AppforgeError::io(e.to_string()))?;
        Ok(Self {
            storage: JsonDirStorage::open(dir).await?,
        })
    }
}

#[async_trait]
impl PublishRepository for JsonDirPublishRepository {
    async fn save(&self, app: &PublishedApp) -> Result<()> {
        self.storage.save(&app.id, app).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PublishedApp>> {
        self.storage.load(id).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<PublishedApp>> {
        let mut apps: Vec<PublishedApp> = self
            .storage
            .load_all()
            .await?
            .into_iter()
            .filter(|app: &PublishedApp| app.user_id == user_id)
            .collect();
        // most recent first
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_repository() -> (JsonDirPublishRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonDirPublishRepository::new(Some(temp_dir.path()))
            .await
            .unwrap();
        (repo, temp_dir)
    }

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let (repo, _guard) = create_test_repository().await;
        let app = PublishedApp::new("Sudoku", "const a = 1", "grid-3x3", "user-1", None);

        repo.save(&app).await.unwrap();
        let loaded = repo.find_by_id(&app.id).await.unwrap().unwrap();
        assert_eq!(loaded, app);
    }

    #[tokio::test]
    async fn missing_id_returns_none() {
        let (repo, _guard) = create_test_repository().await;
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_user_filters_and_sorts() {
        let (repo, _guard) = create_test_repository().await;
        let mut first = PublishedApp::new("A", "a", "zap", "user-1", None);
        first.created_at = "2026-01-01T00:00:00Z".into();
        let mut second = PublishedApp::new("B", "b", "zap", "user-1", None);
        second.created_at = "2026-02-01T00:00:00Z".into();
        let other = PublishedApp::new("C", "c", "zap", "user-2", None);

        for app in [&first, &second, &other] {
            repo.save(app).await.unwrap();
        }

        let apps = repo.list_by_user("user-1").await.unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].name, "B");
        assert_eq!(apps[1].name, "A");
    }
}
