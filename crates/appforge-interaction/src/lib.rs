//! appforge-interaction: everything between the session and the model.
//!
//! - `prompt`: Prompt Composer (framing message, UI-primitive catalog,
//!   vision stripping)
//! - `agent`: the `CompletionAgent` seam and its error taxonomy
//! - `chat_api_agent`: reqwest client for OpenAI-compatible providers,
//!   with the client-side quota gate and quota/transport classification
//! - `extract`: Artifact Extractor with the single repair round trip
//! - `suggestions`: incremental `<suggestion>` stream parser
//! - `supported_models`: the fixed model catalog and capability flags

pub mod agent;
pub mod chat_api_agent;
pub mod extract;
pub mod prompt;
pub mod suggestions;
pub mod supported_models;

pub use agent::{AgentError, CompletionAgent, RequestContext, StreamingAgent};
pub use chat_api_agent::{ChatApiAgent, DEFAULT_FREE_TURN_LIMIT};
pub use supported_models::{SUPPORTED_MODELS, SupportedModel, default_model, find_model};
