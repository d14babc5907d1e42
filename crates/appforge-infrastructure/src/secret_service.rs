//! Secret service implementation.
//!
//! Manages the stored API credential in `~/.config/appforge/secret.json`.
//! Configuration priority: secret.json > `APPFORGE_API_KEY` environment
//! variable.

use crate::paths::AppforgePaths;
use appforge_core::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Stored secret configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    /// API key for the completion provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Service for reading and writing the stored credential, with a cache to
/// avoid repeated file I/O.
#[derive(Debug, Clone)]
pub struct SecretService {
    paths: AppforgePaths,
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretService {
    /// Creates a service reading from the default location.
    pub fn new() -> Self {
        Self::with_base(None)
    }

    /// Creates a service rooted at a custom base directory (for testing).
    pub fn with_base(base: Option<&Path>) -> Self {
        Self {
            paths: AppforgePaths::new(base),
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolves the credential: stored secret first, then the
    /// `APPFORGE_API_KEY` environment variable.
    pub fn api_key(&self) -> Option<String> {
        if let Some(key) = self.load().api_key {
            return Some(key);
        }
        std::env::var("APPFORGE_API_KEY").ok()
    }

    /// Persists a credential and refreshes the cache.
    pub fn store_api_key(&self, api_key: impl Into<String>) -> Result<()> {
        let config = SecretConfig {
            api_key: Some(api_key.into()),
        };
        let path = self
            .paths
            .secret_file()
            .map_err(|e| appforge_core::AppforgeError::config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;

        let mut write_lock = self.secrets.write().unwrap();
        *write_lock = Some(config);
        Ok(())
    }

    fn load(&self) -> SecretConfig {
        {
            let read_lock = self.secrets.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_from_file().unwrap_or_default();

        {
            let mut write_lock = self.secrets.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    fn load_from_file(&self) -> Option<SecretConfig> {
        let path = self.paths.secret_file().ok()?;
        let text = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&text).ok()
    }
}

impl Default for SecretService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stored_key_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let service = SecretService::with_base(Some(temp_dir.path()));

        service.store_api_key("sk-test").unwrap();
        assert_eq!(service.api_key().as_deref(), Some("sk-test"));

        // a fresh instance reads the file, not the cache
        let fresh = SecretService::with_base(Some(temp_dir.path()));
        assert_eq!(fresh.api_key().as_deref(), Some("sk-test"));
    }
}
