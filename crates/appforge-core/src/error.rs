//! Error types for the appforge engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire appforge workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The turn-level taxonomy
/// (transport, quota, malformed completion, empty artifact) lives here so
/// every layer reports failures in the same vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppforgeError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Data access error (repository/storage layer)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/provider failure unrelated to quota
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider signalled a rate/usage limit
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The client-side free-turn gate refused the request
    #[error("Credential required after {0} free requests")]
    CredentialRequired(usize),

    /// The completion carried no envelope, or was still malformed after
    /// the single repair attempt
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    /// Envelope present but the code body was empty after trimming
    #[error("Extraction produced an empty artifact")]
    EmptyArtifact,

    /// A session operation was attempted in a state that forbids it
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppforgeError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a DataAccess error
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates an InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this failure requires user action (supplying a credential)
    /// rather than a simple retry.
    pub fn needs_credential(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_) | Self::CredentialRequired(_))
    }
}

impl From<std::io::Error> for AppforgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AppforgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AppforgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AppforgeError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for AppforgeError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, AppforgeError>`.
pub type Result<T, E = AppforgeError> = std::result::Result<T, E>;
