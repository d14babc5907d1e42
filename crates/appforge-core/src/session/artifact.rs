//! The extracted, renderable artifact.

use serde::{Deserialize, Serialize};

/// Fallback component rendered whenever a turn fails.
///
/// Must stay self-contained: the sandbox renders it with no external props.
const ERROR_COMPONENT: &str = r#"export default function App() {
  return (
    <div className="flex h-screen w-full flex-col items-center justify-center bg-white dark:bg-black">
      <p className="text-2xl font-semibold text-gray-900 dark:text-gray-100">Something went wrong</p>
      <p className="mt-2 text-sm text-gray-500 dark:text-gray-400">The app could not be generated. Edit your prompt and try again.</p>
    </div>
  )
}"#;

/// Name carried by the fallback artifact.
pub const ERROR_ARTIFACT_NAME: &str = "Error occurred";

/// The extracted `{code, name, icon}` unit representing one generated app
/// revision.
///
/// Invariant: when extraction succeeds, `code` is non-empty and a complete
/// self-contained component. A failed turn substitutes [`Artifact::error`]
/// instead; the system never renders an empty or partial artifact as if it
/// were valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Source text of the self-contained UI component.
    pub code: String,
    /// Human-readable app name parsed from the envelope marker.
    pub name: String,
    /// Symbolic icon identifier naming an icon in the external icon set.
    pub icon: String,
}

impl Artifact {
    /// Creates an artifact from extracted parts.
    pub fn new(code: impl Into<String>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            icon: icon.into(),
        }
    }

    /// The fixed fallback artifact shown when a turn fails.
    pub fn error() -> Self {
        Self {
            code: ERROR_COMPONENT.to_string(),
            name: ERROR_ARTIFACT_NAME.to_string(),
            icon: "triangle-alert".to_string(),
        }
    }

    /// Returns true if this is the fallback error artifact.
    pub fn is_error(&self) -> bool {
        self.name == ERROR_ARTIFACT_NAME && self.code == ERROR_COMPONENT
    }
}
