//! Configuration service implementation.
//!
//! Loads the application configuration from `~/.config/appforge/config.toml`
//! and caches it to avoid repeated file I/O.

use crate::paths::AppforgePaths;
use appforge_core::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the OpenAI-compatible provider.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default generation model identifier.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Free requests per session before a user credential is required.
    #[serde(default = "default_free_turn_limit")]
    pub free_turn_limit: usize,
    /// Completion request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.sambanova.ai/v1".to_string()
}

fn default_model() -> String {
    "Meta-Llama-3.1-405B-Instruct".to_string()
}

fn default_free_turn_limit() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            free_turn_limit: default_free_turn_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Configuration service that loads and caches [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: AppforgePaths,
    /// Cached configuration; RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service reading from the default location.
    pub fn new() -> Self {
        Self::with_base(None)
    }

    /// Creates a service rooted at a custom base directory (for testing).
    pub fn with_base(base: Option<&Path>) -> Self {
        Self {
            paths: AppforgePaths::new(base),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached. A missing
    /// or unreadable file yields the defaults.
    pub fn get_config(&self) -> AppConfig {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_default();

        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    /// Persists a configuration and refreshes the cache.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let path = self
            .paths
            .config_file()
            .map_err(|e| appforge_core::AppforgeError::config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(config)?)?;

        let mut write_lock = self.config.write().unwrap();
        *write_lock = Some(config.clone());
        Ok(())
    }

    fn load_config(&self) -> Option<AppConfig> {
        let path = self.paths.config_file().ok()?;
        let text = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(error = %e, "config.toml unreadable, using defaults");
                None
            }
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_base(Some(temp_dir.path()));
        let config = service.get_config();
        assert_eq!(config.free_turn_limit, 3);
        assert_eq!(config.default_model, "Meta-Llama-3.1-405B-Instruct");
    }

    #[test]
    fn save_then_reload_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_base(Some(temp_dir.path()));

        let mut config = AppConfig::default();
        config.free_turn_limit = 10;
        service.save_config(&config).unwrap();

        service.invalidate_cache();
        assert_eq!(service.get_config().free_turn_limit, 10);
    }
}
