//! Repository traits for external storage.
//!
//! The publish/fetch gateway and image staging are thin CRUD boundaries;
//! the engine depends only on these contracts, never on a concrete store.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A published app record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedApp {
    /// Unique identifier (UUID format).
    pub id: String,
    /// Human-readable app name.
    pub name: String,
    /// The published component source.
    pub code: String,
    /// Symbolic icon identifier.
    pub icon: String,
    /// Owning user identity.
    pub user_id: String,
    /// Preview image URL, if a screenshot was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Timestamp when the record was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the record was last updated (ISO 8601 format).
    pub updated_at: String,
}

impl PublishedApp {
    /// Creates a new record with a fresh id and timestamps.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        icon: impl Into<String>,
        user_id: impl Into<String>,
        image_url: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            code: code.into(),
            icon: icon.into(),
            user_id: user_id.into(),
            image_url,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Storage boundary for published apps.
#[async_trait]
pub trait PublishRepository: Send + Sync {
    /// Persists a published app record.
    async fn save(&self, app: &PublishedApp) -> Result<()>;

    /// Looks up a published app by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<PublishedApp>>;

    /// Lists all apps published by a user, most recent first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<PublishedApp>>;
}

/// Storage boundary for staged vision images.
///
/// Raw image bytes arrive as a data URL and are handed back an opaque id;
/// the id is later resolved to the data URL for inclusion in a multimodal
/// prompt.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Stores a data URL and returns its opaque id.
    async fn stage(&self, data_url: &str) -> Result<String>;

    /// Resolves a staged image id back to its data URL.
    async fn resolve(&self, id: &str) -> Result<Option<String>>;
}
