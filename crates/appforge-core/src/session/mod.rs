//! Session domain module.
//!
//! This module contains all session-related domain models and the
//! conversation state machine.
//!
//! # Module Structure
//!
//! - `model`: Session aggregate and turn/fork/preview operations (`Session`)
//! - `message`: Conversation message types (`Message`, `MessageRole`, `ContentPart`)
//! - `artifact`: The extracted renderable unit (`Artifact`)
//! - `version`: Version history entries (`Version`)
//! - `state`: Explicit session states (`SessionState`)
//! - `repository`: Repository trait for session persistence

mod artifact;
mod message;
mod model;
mod repository;
mod state;
mod version;

// Re-export public API
pub use artifact::{Artifact, ERROR_ARTIFACT_NAME};
pub use message::{ContentPart, ImageUrl, Message, MessageRole};
pub use model::{ForkPoint, PendingTurn, Session};
pub use repository::SessionRepository;
pub use state::SessionState;
pub use version::{Version, generate_version_id};
