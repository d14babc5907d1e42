//! JsonDirStorage-based SessionRepository implementation.

use crate::json_dir_storage::JsonDirStorage;
use crate::paths::AppforgePaths;
use appforge_core::error::{AppforgeError, Result};
use appforge_core::session::{Session, SessionRepository};
use async_trait::async_trait;
use std::path::Path;

pub struct JsonDirSessionRepository {
    storage: JsonDirStorage,
}

impl JsonDirSessionRepository {
    /// Creates a repository at the default location.
    pub async fn default() -> Result<Self> {
        Self::new(None).await
    }

    /// Creates a repository under a custom base directory (for testing).
    pub async fn new(base_dir: Option<&Path>) -> Result<Self> {
        let dir = AppforgePaths::new(base_dir)
            .sessions_dir()
            .map_err(|e| AppforgeError::io(e.to_string()))?;
        Ok(Self {
            storage: JsonDirStorage::open(dir).await?,
        })
    }
}

#[async_trait]
impl SessionRepository for JsonDirSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.storage.load(session_id).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.storage.save(&session.id, session).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.storage.delete(session_id).await
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.storage.load_all().await?;
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn session_round_trip_preserves_history() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonDirSessionRepository::new(Some(temp_dir.path()))
            .await
            .unwrap();

        let mut session = Session::new("sudoku");
        session.begin_turn("make a sudoku app").unwrap();
        session
            .complete_turn(
                r#"<appArtifact name="Sudoku" icon="grid-3x3">const a = 1</appArtifact>"#,
                appforge_core::session::Artifact::new("const a = 1", "Sudoku", "grid-3x3"),
            )
            .unwrap();

        repo.save(&session).await.unwrap();
        let loaded = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);

        repo.delete(&session.id).await.unwrap();
        assert!(repo.find_by_id(&session.id).await.unwrap().is_none());
    }
}
