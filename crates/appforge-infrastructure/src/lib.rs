//! appforge-infrastructure: storage and configuration adapters.
//!
//! Implements the core repository traits over one-JSON-file-per-record
//! directory storage under the platform config dir, plus the config and
//! secret services the application layer wires into the agent.

pub mod config_service;
pub mod json_dir_image_repository;
pub mod json_dir_publish_repository;
pub mod json_dir_session_repository;
pub mod json_dir_storage;
pub mod paths;
pub mod secret_service;

pub use config_service::{AppConfig, ConfigService};
pub use json_dir_image_repository::JsonDirImageRepository;
pub use json_dir_publish_repository::JsonDirPublishRepository;
pub use json_dir_session_repository::JsonDirSessionRepository;
pub use paths::AppforgePaths;
pub use secret_service::{SecretConfig, SecretService};
