//! The completion-agent seam.
//!
//! Everything above the wire codes against [`CompletionAgent`]; the
//! reqwest implementation lives in `chat_api_agent` and tests substitute
//! mocks.

use appforge_core::AppforgeError;
use appforge_core::session::Message;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Typed failures surfaced by a completion agent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The client-side admission gate refused the request: the free-turn
    /// allowance is spent and no caller credential was supplied. No
    /// network call was made.
    #[error("credential required after {0} free requests")]
    CredentialRequired(usize),

    /// The provider signalled a rate/usage limit. Requires user action
    /// (supply a credential), not a retry.
    #[error("provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Network-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status unrelated to quota.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider's response body could not be interpreted.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<AgentError> for AppforgeError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::CredentialRequired(limit) => Self::CredentialRequired(limit),
            AgentError::QuotaExceeded(message) => Self::QuotaExceeded(message),
            AgentError::Transport(message) => Self::Transport(message),
            AgentError::Provider { status, message } => {
                Self::Transport(format!("provider returned {status}: {message}"))
            }
            AgentError::Malformed(message) => Self::Transport(message),
        }
    }
}

/// Per-request context the caller threads through to the agent.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Completed requests so far in this session; drives the quota gate.
    pub prior_requests: usize,
    /// Caller-supplied credential override. Its presence bypasses the
    /// free-turn gate.
    pub credential_override: Option<String>,
}

impl RequestContext {
    /// Context for a session's nth request without a credential override.
    pub fn new(prior_requests: usize) -> Self {
        Self {
            prior_requests,
            credential_override: None,
        }
    }

    /// Attaches a caller-supplied credential.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential_override = Some(credential.into());
        self
    }
}

/// A chat-completion round trip: message list in, raw completion text out.
#[async_trait]
pub trait CompletionAgent: Send + Sync {
    /// Performs one completion request.
    ///
    /// # Errors
    ///
    /// `CredentialRequired` when the admission gate refuses the request
    /// client-side; `QuotaExceeded` when the provider signals a usage
    /// limit; `Transport`/`Provider`/`Malformed` for everything else.
    /// Transient failures are surfaced, never silently retried.
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        ctx: &RequestContext,
    ) -> Result<String, AgentError>;
}

/// A streamed completion: system + user prompt in, text deltas out.
///
/// Only the best-effort suggestions flow consumes this; the primary
/// artifact path never streams.
#[async_trait]
pub trait StreamingAgent: Send + Sync {
    async fn stream_text(
        &self,
        system: &str,
        prompt: &str,
        model: &str,
        ctx: &RequestContext,
    ) -> Result<BoxStream<'static, Result<String, AgentError>>, AgentError>;
}
