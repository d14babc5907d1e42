//! Version history entries.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Length of generated version id tokens.
const VERSION_ID_LEN: usize = 12;

/// A point in history the user can revisit.
///
/// Created immediately after successful extraction of a new artifact and
/// appended to the session's ordered version list. `screenshot` is the one
/// field mutated after creation: the sandbox's asynchronous capture
/// attaches it later, addressed by version id so the write tolerates
/// versions appended in the meantime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Collision-resistant random token identifying this version.
    pub id: String,
    /// The code of the artifact produced by that turn.
    pub content: String,
    /// The user text that produced it.
    pub prompt: String,
    /// Captured preview image (data URL), attached asynchronously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Correlation token of the turn that produced this version. Locates
    /// the message-log truncation point on a fork.
    pub correlation_id: String,
    /// Timestamp when the version was created (ISO 8601 format).
    pub created_at: String,
}

impl Version {
    /// Creates a new version for a successful turn.
    pub fn new(
        content: impl Into<String>,
        prompt: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_version_id(),
            content: content.into(),
            prompt: prompt.into(),
            screenshot: None,
            correlation_id: correlation_id.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Generates a random alphanumeric version id.
pub fn generate_version_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERSION_ID_LEN)
        .map(char::from)
        .collect()
}
