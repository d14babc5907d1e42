//! Session aggregate and the conversation state machine.
//!
//! The session exclusively owns its message log and version list. Both are
//! append-only under single-writer discipline; the only removal is the
//! suffix truncation a fork performs, and that is applied atomically with
//! the appends of the turn that follows it, so a failed turn can never
//! leave history partially truncated.

use super::artifact::Artifact;
use super::message::Message;
use super::state::SessionState;
use super::version::Version;
use crate::error::{AppforgeError, Result};
use serde::{Deserialize, Serialize};

/// Truncation point computed when a turn is submitted from a history
/// preview. Applied when the turn completes successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkPoint {
    /// Messages are cut to this length (the pair ending the selected
    /// version's turn is the last survivor).
    pub message_cut: usize,
    /// Versions are cut to this length (selected index + 1).
    pub version_cut: usize,
}

/// The turn currently in flight: recorded at submission, consumed when the
/// turn completes or fails. Nothing is appended to history until success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTurn {
    /// The user's prompt text for this turn.
    pub text: String,
    /// Staged image (data URL) consumed by this turn, if any.
    pub image: Option<String>,
    /// Correlation token linking the turn's user/assistant message pair.
    pub correlation_id: String,
    /// Set when the turn was submitted from a history preview.
    pub fork: Option<ForkPoint>,
}

/// A single generation session: the conversation, its version history, and
/// the currently displayed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// Human-readable session title (usually the initial prompt).
    pub title: String,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format).
    pub updated_at: String,
    /// Current state of the conversation state machine.
    pub state: SessionState,
    /// Append-only conversation log.
    pub messages: Vec<Message>,
    /// Ordered version history; one entry per successful assistant turn.
    pub versions: Vec<Version>,
    /// The currently displayed artifact, if any turn has succeeded.
    pub artifact: Option<Artifact>,
    /// Index of the version selected for preview; `None` means "at head".
    pub selected_version: Option<usize>,
    /// Image (data URL) staged for the next turn.
    pub staged_image: Option<String>,
    /// Number of completed requests, used for quota gating.
    pub request_count: usize,
    /// Suggestions for the current artifact; cleared on every new turn.
    pub suggestions: Vec<String>,
    /// The turn currently in flight, if any.
    pub pending: Option<PendingTurn>,
}

impl Session {
    /// Creates a new idle session.
    pub fn new(title: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now.clone(),
            updated_at: now,
            state: SessionState::Idle,
            messages: Vec::new(),
            versions: Vec::new(),
            artifact: None,
            selected_version: None,
            staged_image: None,
            request_count: 0,
            suggestions: Vec::new(),
            pending: None,
        }
    }

    /// Stages an image (data URL) for the next turn.
    pub fn stage_image(&mut self, data_url: impl Into<String>) {
        self.staged_image = Some(data_url.into());
        self.touch();
    }

    /// Replaces the suggestion list for the current artifact.
    pub fn set_suggestions(&mut self, suggestions: Vec<String>) {
        self.suggestions = suggestions;
    }

    /// Submits a new turn: `idle`/`displaying`/`previewing-history` →
    /// `generating`.
    ///
    /// Clears stale suggestions, consumes the staged image, and, when
    /// submitting from a history preview, records the fork point that
    /// [`Session::complete_turn`] will apply. Returns the pending turn so
    /// the caller can compose the outgoing prompt.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if a request is already in flight or the
    /// session is parked awaiting a credential.
    pub fn begin_turn(&mut self, user_text: impl Into<String>) -> Result<PendingTurn> {
        if !self.state.accepts_submission() {
            return Err(AppforgeError::invalid_state(format!(
                "cannot submit while {}",
                self.state
            )));
        }

        let fork = match self.selected_version {
            Some(index) if index + 1 < self.versions.len() => Some(self.fork_point(index)?),
            _ => None,
        };

        let pending = PendingTurn {
            text: user_text.into(),
            image: self.staged_image.take(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
            fork,
        };

        self.suggestions.clear();
        self.pending = Some(pending.clone());
        self.state = SessionState::Generating;
        self.touch();
        Ok(pending)
    }

    /// The conversation history the next prompt should be composed from.
    ///
    /// While a fork is pending this is the truncated prefix; the log
    /// itself is not touched until the turn succeeds.
    pub fn history_for_prompt(&self) -> &[Message] {
        if let Some(PendingTurn {
            fork: Some(fork), ..
        }) = &self.pending
        {
            &self.messages[..fork.message_cut]
        } else {
            &self.messages
        }
    }

    /// Records a successful turn: `generating` → `displaying`.
    ///
    /// Applies any pending fork truncation, then appends the user and
    /// assistant message pair and a new version, resets the history
    /// pointer to head, and counts the request toward the quota gate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if no turn is in flight.
    pub fn complete_turn(&mut self, raw_response: &str, artifact: Artifact) -> Result<()> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| AppforgeError::invalid_state("no turn in flight"))?;

        if let Some(fork) = pending.fork {
            self.messages.truncate(fork.message_cut);
            self.versions.truncate(fork.version_cut);
        }

        let mut user_message = Message::user(&pending.text, &pending.correlation_id);
        if let Some(image) = &pending.image {
            user_message = user_message.with_image(image);
        }
        self.messages.push(user_message);
        self.messages
            .push(Message::assistant(raw_response, &pending.correlation_id));

        self.versions.push(Version::new(
            &artifact.code,
            &pending.text,
            &pending.correlation_id,
        ));

        self.artifact = Some(artifact);
        self.selected_version = None;
        self.request_count += 1;
        self.state = SessionState::Displaying;
        self.touch();
        Ok(())
    }

    /// Records a failed turn: `generating` → `displaying` with the fixed
    /// error artifact shown.
    ///
    /// No message pair or version is appended and no pending fork is
    /// applied: history is left exactly as it was before the attempt. The
    /// image the turn consumed is re-staged for the retry.
    pub fn fail_turn(&mut self) {
        self.discard_pending();
        self.artifact = Some(Artifact::error());
        self.state = SessionState::Displaying;
        self.touch();
    }

    /// Selects a version for preview: `displaying` → `previewing-history`.
    ///
    /// The displayed artifact is swapped to that version's content;
    /// messages and versions are untouched. Selecting the head version
    /// returns to `displaying` at head.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an out-of-range index and `InvalidState`
    /// while a request is in flight.
    pub fn select_version(&mut self, index: usize) -> Result<()> {
        if self.state == SessionState::Generating {
            return Err(AppforgeError::invalid_state(
                "cannot change versions while generating",
            ));
        }
        let version = self
            .versions
            .get(index)
            .ok_or_else(|| AppforgeError::not_found("version", index.to_string()))?;

        if let Some(artifact) = &mut self.artifact {
            artifact.code = version.content.clone();
        }

        if index + 1 == self.versions.len() {
            self.selected_version = None;
            self.state = SessionState::Displaying;
        } else {
            self.selected_version = Some(index);
            self.state = SessionState::PreviewingHistory;
        }
        self.touch();
        Ok(())
    }

    /// Parks the session behind the quota gate: → `awaiting-credential`.
    ///
    /// Any image the blocked turn consumed is re-staged so the
    /// resubmission after supplying a credential still carries it.
    pub fn require_credential(&mut self) {
        self.discard_pending();
        self.state = SessionState::AwaitingCredential;
        self.touch();
    }

    /// Unblocks the session after the user supplied a credential.
    pub fn credential_supplied(&mut self) {
        if self.state == SessionState::AwaitingCredential {
            self.state = if self.versions.is_empty() {
                SessionState::Idle
            } else {
                SessionState::Displaying
            };
            self.touch();
        }
    }

    /// Attaches an asynchronously captured screenshot to a version by id.
    ///
    /// Addressed by identity so the write tolerates versions appended
    /// since the capture was requested. The field is written once; a
    /// second capture for the same version is ignored. Returns false if
    /// the version no longer exists (discarded by a fork).
    pub fn attach_screenshot(&mut self, version_id: &str, data_url: impl Into<String>) -> bool {
        match self.versions.iter_mut().find(|v| v.id == version_id) {
            Some(version) => {
                if version.screenshot.is_none() {
                    version.screenshot = Some(data_url.into());
                }
                true
            }
            None => false,
        }
    }

    /// Drops the in-flight turn, handing its consumed image back to the
    /// staging slot (unless a newer image was staged meanwhile).
    fn discard_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if self.staged_image.is_none() {
                self.staged_image = pending.image;
            }
        }
    }

    /// Computes where a fork at `index` cuts the message log and version
    /// list: messages survive through the assistant message of the
    /// selected version's turn, versions through the selected index.
    fn fork_point(&self, index: usize) -> Result<ForkPoint> {
        let version = self
            .versions
            .get(index)
            .ok_or_else(|| AppforgeError::not_found("version", index.to_string()))?;

        let message_cut = self
            .messages
            .iter()
            .rposition(|m| m.correlation_id.as_deref() == Some(version.correlation_id.as_str()))
            .map(|pos| pos + 1)
            .unwrap_or(self.messages.len());

        Ok(ForkPoint {
            message_cut,
            version_cut: index + 1,
        })
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
