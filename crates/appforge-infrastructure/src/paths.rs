//! Unified path management for appforge configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/appforge/          # Config directory
//! ├── config.toml              # Application configuration
//! ├── secret.json              # Stored API credential
//! ├── sessions/                # Session records (JSON per session)
//! ├── published/               # Published app records (JSON per app)
//! └── images/                  # Staged vision images (JSON per image)
//! ```

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home/config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for appforge.
///
/// A custom base (used by tests) overrides the platform config directory.
#[derive(Debug, Clone, Default)]
pub struct AppforgePaths {
    base: Option<PathBuf>,
}

impl AppforgePaths {
    /// Creates a path resolver, optionally rooted at a custom base.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// The appforge configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join("appforge"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Path of `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Path of `secret.json`.
    pub fn secret_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    /// Directory holding session records.
    pub fn sessions_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("sessions"))
    }

    /// Directory holding published app records.
    pub fn published_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("published"))
    }

    /// Directory holding staged vision images.
    pub fn images_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("images"))
    }
}
