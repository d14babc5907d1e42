//! Artifact Extractor.
//!
//! Turns a raw completion into a valid [`Artifact`], recovering from the
//! one malformation worth recovering from: a generation cut off before
//! the closing marker. Recovery is exactly one follow-up completion; a
//! response that is still malformed afterwards fails the turn.

use crate::agent::{CompletionAgent, RequestContext};
use appforge_core::envelope::{self, EnvelopeError};
use appforge_core::error::{AppforgeError, Result};
use appforge_core::session::{Artifact, Message};

const REPAIR_SYSTEM_PROMPT: &str = "You are completing a code generation that was cut off \
mid-output. Continue the text exactly where it stopped. Output only the continuation, ending \
with the closing </appArtifact> tag. Do not repeat what was already written. Never use \
markdown code fences.";

/// Extracts an artifact from a raw completion, issuing at most one repair
/// request through `agent` when the envelope is unterminated.
pub async fn extract<A: CompletionAgent + ?Sized>(
    agent: &A,
    raw: &str,
    model: &str,
    ctx: &RequestContext,
) -> Result<Artifact> {
    match envelope::parse_envelope(raw) {
        Ok(env) => Ok(Artifact::new(env.code, env.name, env.icon)),
        Err(EnvelopeError::Unterminated) => repair(agent, raw, model, ctx).await,
        Err(EnvelopeError::EmptyBody) => Err(AppforgeError::EmptyArtifact),
        Err(EnvelopeError::MissingEnvelope) => Err(AppforgeError::MalformedCompletion(
            "completion contains no envelope".into(),
        )),
    }
}

/// The sole automatic repair path: ask the model to finish the unfinished
/// code, splice, and re-validate. Never issues a second repair request.
async fn repair<A: CompletionAgent + ?Sized>(
    agent: &A,
    truncated: &str,
    model: &str,
    ctx: &RequestContext,
) -> Result<Artifact> {
    tracing::warn!("completion unterminated, issuing one repair request");

    let messages = vec![
        Message::system(REPAIR_SYSTEM_PROMPT),
        Message::user_uncorrelated(truncated),
    ];
    let continuation = agent.complete(&messages, model, ctx).await?;

    // A full re-emission replaces the truncated text; a continuation is
    // appended to it.
    let candidate = if envelope::has_open_marker(&continuation) {
        continuation
    } else {
        format!("{truncated}{continuation}")
    };

    match envelope::parse_envelope(&candidate) {
        Ok(env) => Ok(Artifact::new(env.code, env.name, env.icon)),
        Err(EnvelopeError::EmptyBody) => Err(AppforgeError::EmptyArtifact),
        Err(_) => Err(AppforgeError::MalformedCompletion(
            "envelope still malformed after repair".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Agent double that returns canned responses and records call counts.
    struct MockAgent {
        responses: Mutex<Vec<String>>,
        calls: Mutex<usize>,
    }

    impl MockAgent {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionAgent for MockAgent {
        async fn complete(
            &self,
            _messages: &[Message],
            _model: &str,
            _ctx: &RequestContext,
        ) -> Result<String, AgentError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(AgentError::Transport("no canned response".into()));
            }
            Ok(responses.remove(0))
        }
    }

    const MODEL: &str = "Meta-Llama-3.1-405B-Instruct";

    #[tokio::test]
    async fn well_formed_completion_needs_no_request() {
        let agent = MockAgent::new(vec![]);
        let raw = r#"<appArtifact name="Timer" icon="clock">const a = 1</appArtifact>"#;
        let artifact = extract(&agent, raw, MODEL, &RequestContext::default())
            .await
            .unwrap();
        assert_eq!(artifact.name, "Timer");
        assert_eq!(artifact.code, "const a = 1");
        assert_eq!(agent.call_count(), 0);
    }

    #[tokio::test]
    async fn unterminated_completion_triggers_exactly_one_repair() {
        let agent = MockAgent::new(vec!["urn <div/>\n}</appArtifact>"]);
        let raw = r#"<appArtifact name="Timer" icon="clock">function App() {
  ret"#;
        let artifact = extract(&agent, raw, MODEL, &RequestContext::default())
            .await
            .unwrap();
        assert_eq!(agent.call_count(), 1);
        assert!(artifact.code.contains("return <div/>"));
    }

    #[tokio::test]
    async fn repair_that_re_emits_the_whole_envelope_replaces_the_truncated_text() {
        let agent = MockAgent::new(vec![
            r#"<appArtifact name="Timer" icon="clock">const fixed = true</appArtifact>"#,
        ]);
        let raw = r#"<appArtifact name="Timer" icon="clock">const broken ="#;
        let artifact = extract(&agent, raw, MODEL, &RequestContext::default())
            .await
            .unwrap();
        assert_eq!(artifact.code, "const fixed = true");
    }

    #[tokio::test]
    async fn still_malformed_after_repair_fails_without_a_second_request() {
        let agent = MockAgent::new(vec!["still no closing tag"]);
        let raw = r#"<appArtifact name="Timer" icon="clock">const a ="#;
        let err = extract(&agent, raw, MODEL, &RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppforgeError::MalformedCompletion(_)));
        assert_eq!(agent.call_count(), 1);
    }

    #[tokio::test]
    async fn prose_fails_hard_without_any_request() {
        let agent = MockAgent::new(vec![]);
        let err = extract(
            &agent,
            "Sure, here's an app idea for you!",
            MODEL,
            &RequestContext::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppforgeError::MalformedCompletion(_)));
        assert_eq!(agent.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_body_maps_to_empty_artifact() {
        let agent = MockAgent::new(vec![]);
        let raw = r#"<appArtifact name="Timer" icon="clock">   </appArtifact>"#;
        let err = extract(&agent, raw, MODEL, &RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppforgeError::EmptyArtifact));
    }
}
