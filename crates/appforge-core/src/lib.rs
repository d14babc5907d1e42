//! appforge-core: domain model for the prompt-to-app generation engine.
//!
//! Owns the conversation state machine (sessions, messages, versions,
//! artifacts), the envelope wire-format parser, the shared error type, and
//! the repository traits the outer layers implement.

pub mod envelope;
pub mod error;
pub mod repository;
pub mod session;

// Re-export common error type
pub use error::AppforgeError;
