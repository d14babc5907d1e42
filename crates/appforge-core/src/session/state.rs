//! Explicit session states.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The conversation state machine's states.
///
/// Exactly one generation request is in flight per session: submissions
/// are refused while `Generating`, so history truncation (fork) and
/// appends never interleave with an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    /// No artifact yet; waiting for the initial prompt.
    Idle,
    /// A generation/revision request is in flight.
    Generating,
    /// An artifact is rendered; awaiting further input.
    Displaying,
    /// An older version is selected for preview, not yet the active head.
    PreviewingHistory,
    /// The quota gate is blocking progress until a credential is supplied.
    AwaitingCredential,
}

impl SessionState {
    /// Returns true if a new submission may start from this state.
    pub fn accepts_submission(&self) -> bool {
        matches!(
            self,
            Self::Idle | Self::Displaying | Self::PreviewingHistory
        )
    }
}
