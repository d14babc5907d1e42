//! ChatApiAgent - Direct REST implementation against an OpenAI-compatible
//! chat-completions endpoint.
//!
//! Configuration priority: explicit builder values > environment variables
//! (`APPFORGE_API_KEY`, `APPFORGE_BASE_URL`). The SambaNova endpoint is the
//! default provider.

use crate::agent::{AgentError, CompletionAgent, RequestContext, StreamingAgent};
use appforge_core::session::{ContentPart, Message, MessageRole};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.sambanova.ai/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of requests a session may make without a caller
/// credential before the admission gate closes.
pub const DEFAULT_FREE_TURN_LIMIT: usize = 3;

/// Agent implementation that talks to an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct ChatApiAgent {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    free_turn_limit: usize,
    max_tokens: Option<u32>,
}

impl ChatApiAgent {
    /// Creates a new agent against the given base URL, with an optional
    /// service credential.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into(),
            api_key,
            free_turn_limit: DEFAULT_FREE_TURN_LIMIT,
            max_tokens: None,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `APPFORGE_BASE_URL` defaults to the SambaNova endpoint;
    /// `APPFORGE_API_KEY` is optional (callers may supply their own
    /// credential per request).
    pub fn try_from_env() -> Self {
        let base_url = env::var("APPFORGE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let api_key = env::var("APPFORGE_API_KEY").ok();
        Self::new(base_url, api_key)
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    /// Overrides the free-turn limit after construction.
    pub fn with_free_turn_limit(mut self, limit: usize) -> Self {
        self.free_turn_limit = limit;
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Free requests admitted per session before a credential is required.
    pub fn free_turn_limit(&self) -> usize {
        self.free_turn_limit
    }

    /// The client-side admission gate.
    ///
    /// Without a caller credential, a session gets `free_turn_limit`
    /// requests; past that the request is refused before any network call.
    fn admit(&self, ctx: &RequestContext) -> Result<String, AgentError> {
        if let Some(credential) = &ctx.credential_override {
            return Ok(credential.clone());
        }
        if ctx.prior_requests >= self.free_turn_limit {
            return Err(AgentError::CredentialRequired(self.free_turn_limit));
        }
        self.api_key
            .clone()
            .ok_or_else(|| AgentError::CredentialRequired(0))
    }

    async fn send_request(
        &self,
        body: &ChatCompletionRequest,
        api_key: &str,
    ) -> Result<reqwest::Response, AgentError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| AgentError::Transport(format!("completion request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read provider error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl StreamingAgent for ChatApiAgent {
    /// Issues a streaming completion and yields text deltas as they
    /// arrive.
    async fn stream_text(
        &self,
        system: &str,
        prompt: &str,
        model: &str,
        ctx: &RequestContext,
    ) -> Result<BoxStream<'static, Result<String, AgentError>>, AgentError> {
        let api_key = match &ctx.credential_override {
            Some(credential) => credential.clone(),
            None => self
                .api_key
                .clone()
                .ok_or_else(|| AgentError::CredentialRequired(0))?,
        };

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: WireContent::Text(system.to_string()),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: WireContent::Text(prompt.to_string()),
                },
            ],
            stream: true,
            max_tokens: self.max_tokens,
        };

        let response = self.send_request(&request, &api_key).await?;

        let deltas = response
            .bytes_stream()
            .map_err(|err| AgentError::Transport(format!("stream read failed: {err}")))
            .scan(SseDecoder::default(), |decoder, chunk| {
                let items: Vec<Result<String, AgentError>> = match chunk {
                    Ok(bytes) => decoder.push(&bytes).into_iter().map(Ok).collect(),
                    Err(err) => vec![Err(err)],
                };
                futures::future::ready(Some(stream::iter(items)))
            })
            .flatten();

        Ok(deltas.boxed())
    }
}

#[async_trait]
impl CompletionAgent for ChatApiAgent {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        ctx: &RequestContext,
    ) -> Result<String, AgentError> {
        let api_key = self.admit(ctx)?;

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: messages.iter().map(WireMessage::from).collect(),
            stream: false,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model, messages = messages.len(), "sending completion request");
        let response = self.send_request(&request, &api_key).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| AgentError::Malformed(format!("failed to parse response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: WireContent,
}

/// Message content on the wire: a bare string for plain text, the
/// multimodal part array otherwise.
#[derive(Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        };
        let content = if message.has_image() {
            WireContent::Parts(message.content.clone())
        } else {
            WireContent::Text(message.text())
        };
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, AgentError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AgentError::Malformed("provider returned no content".into()))
}

/// Classifies a non-2xx response: rate/usage limits become `QuotaExceeded`
/// (which parks the session awaiting a credential), everything else a
/// generic provider error.
fn map_http_error(status: StatusCode, body: String) -> AgentError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    let lowered = message.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("rate limit")
        || lowered.contains("quota")
    {
        return AgentError::QuotaExceeded(message);
    }

    AgentError::Provider {
        status: status.as_u16(),
        message,
    }
}

/// Incremental decoder for `text/event-stream` bodies: buffers raw bytes
/// across chunks and yields the text deltas carried by `data:` events.
///
/// Decoding happens per complete line, never per network chunk, so a
/// multi-byte UTF-8 character split across two chunks survives intact.
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut deltas = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() || payload == "[DONE]" {
                continue;
            }
            if let Some(delta) = parse_delta(payload) {
                deltas.push(delta);
            }
        }
        deltas
    }
}

fn parse_delta(payload: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    let content = value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()?;
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_gate_refuses_before_any_network_call() {
        let agent = ChatApiAgent::new(DEFAULT_BASE_URL, Some("service-key".into()))
            .with_free_turn_limit(3);

        // within the free allowance
        assert!(agent.admit(&RequestContext::new(2)).is_ok());
        // allowance spent, no override
        assert_eq!(
            agent.admit(&RequestContext::new(3)),
            Err(AgentError::CredentialRequired(3))
        );
        // a caller credential bypasses the gate
        let ctx = RequestContext::new(10).with_credential("user-key");
        assert_eq!(agent.admit(&ctx).unwrap(), "user-key");
    }

    #[test]
    fn quota_errors_are_distinguished_from_transport() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit exceeded"}}"#.into(),
        );
        assert!(matches!(err, AgentError::QuotaExceeded(_)));

        let err = map_http_error(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"error":{"message":"Monthly quota exhausted"}}"#.into(),
        );
        assert!(matches!(err, AgentError::QuotaExceeded(_)));

        let err = map_http_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".into());
        assert!(matches!(err, AgentError::Provider { status: 500, .. }));
    }

    #[test]
    fn sse_decoder_handles_split_events() {
        let mut decoder = SseDecoder::default();
        let first = decoder
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"hel\"}}]}\ndata: {\"choi");
        assert_eq!(first, vec!["hel".to_string()]);

        let second = decoder.push(b"ces\":[{\"delta\":{\"content\":\"lo\"}}]}\ndata: [DONE]\n");
        assert_eq!(second, vec!["lo".to_string()]);
    }

    #[test]
    fn sse_decoder_reassembles_multibyte_chars_split_across_chunks() {
        let event: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"caf\xc3\xa9\"}}]}\n";
        // cut between the two bytes of the encoded e-acute
        let cut = event.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::default();
        assert!(decoder.push(&event[..cut]).is_empty());
        assert_eq!(decoder.push(&event[cut..]), vec!["café".to_string()]);
    }

    #[test]
    fn plain_text_messages_serialize_as_bare_strings() {
        let message = Message::user("make a todo app", "c1");
        let wire = WireMessage::from(&message);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "make a todo app");

        let with_image = Message::user("like this", "c2").with_image("data:image/png;base64,AA");
        let wire = WireMessage::from(&with_image);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
    }
}
