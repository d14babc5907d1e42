//! Turn use case: one user turn, end to end.
//!
//! Threads a submission through composer → completion client → extractor →
//! state machine, converting every failure into the fixed error artifact
//! at the turn boundary. The conversation log and version history are left
//! exactly as they were before a failed turn; the single transparent
//! repair completion inside the extractor is the only exception to
//! "no retries".

use appforge_core::error::{AppforgeError, Result};
use appforge_core::session::{Artifact, Session};
use appforge_interaction::agent::{CompletionAgent, RequestContext, StreamingAgent};
use appforge_interaction::suggestions::{self, SUGGESTIONS_SYSTEM_PROMPT};
use appforge_interaction::supported_models::{self, SUGGESTIONS_MODEL, SupportedModel};
use appforge_interaction::{extract, prompt};
use std::sync::Arc;

/// What a submission produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Extraction succeeded; the new artifact is displayed and recorded.
    Completed(Artifact),
    /// The turn failed; the fixed error artifact is displayed, history is
    /// untouched, and the revision input stays usable.
    Failed(AppforgeError),
    /// The session is parked awaiting a user credential (quota gate or
    /// provider usage limit).
    CredentialRequired,
}

/// Orchestrates generation/revision turns against a completion agent.
pub struct TurnUsecase<A: ?Sized> {
    agent: Arc<A>,
}

impl<A: CompletionAgent + ?Sized> TurnUsecase<A> {
    pub fn new(agent: Arc<A>) -> Self {
        Self { agent }
    }

    /// Submits one turn for `session`.
    ///
    /// Handles the full state-machine round trip, including the fork when
    /// the user submits from a history preview and the
    /// `awaiting-credential` unblock when a credential arrives with the
    /// submission.
    ///
    /// # Errors
    ///
    /// Only caller bugs surface as `Err` (submitting while a request is
    /// in flight, unknown model id). Turn-level failures are part of
    /// [`TurnOutcome`].
    #[tracing::instrument(skip_all, fields(session = %session.id, model = model_value))]
    pub async fn submit(
        &self,
        session: &mut Session,
        user_text: &str,
        model_value: &str,
        credential: Option<String>,
    ) -> Result<TurnOutcome> {
        let model = supported_models::find_model(model_value)
            .ok_or_else(|| AppforgeError::config(format!("unknown model: {model_value}")))?;

        if session.state == appforge_core::session::SessionState::AwaitingCredential {
            if credential.is_some() {
                session.credential_supplied();
            } else {
                return Ok(TurnOutcome::CredentialRequired);
            }
        }

        let ctx = RequestContext {
            prior_requests: session.request_count,
            credential_override: credential,
        };

        let pending = session.begin_turn(user_text)?;
        let messages = prompt::compose(
            session.history_for_prompt(),
            &pending.text,
            pending.image.as_deref(),
            model,
        );

        let raw = match self.agent.complete(&messages, model.value, &ctx).await {
            Ok(raw) => raw,
            Err(err) => return Ok(self.resolve_failure(session, err.into())),
        };

        match extract::extract(self.agent.as_ref(), &raw, model.value, &ctx).await {
            Ok(artifact) => {
                session.complete_turn(&raw, artifact.clone())?;
                tracing::info!(name = %artifact.name, versions = session.versions.len(), "turn completed");
                Ok(TurnOutcome::Completed(artifact))
            }
            Err(err) => Ok(self.resolve_failure(session, err)),
        }
    }

    /// Applies the failure policy: quota conditions park the session
    /// behind the credential gate; everything else shows the error
    /// artifact without touching history.
    fn resolve_failure(&self, session: &mut Session, err: AppforgeError) -> TurnOutcome {
        if err.needs_credential() {
            tracing::info!(error = %err, "turn blocked pending credential");
            session.require_credential();
            TurnOutcome::CredentialRequired
        } else {
            tracing::warn!(error = %err, "turn failed, substituting error artifact");
            session.fail_turn();
            TurnOutcome::Failed(err)
        }
    }
}

impl<A: CompletionAgent + StreamingAgent + ?Sized> TurnUsecase<A> {
    /// Refreshes the suggestion list for the currently displayed artifact.
    ///
    /// Strictly best-effort and independent of the artifact flow: any
    /// failure leaves the session's (already cleared) suggestions empty.
    pub async fn refresh_suggestions(
        &self,
        session: &mut Session,
        credential: Option<String>,
    ) -> Vec<String> {
        let Some(artifact) = &session.artifact else {
            return Vec::new();
        };
        let ctx = RequestContext {
            prior_requests: session.request_count,
            credential_override: credential,
        };

        let stream = match self
            .agent
            .stream_text(SUGGESTIONS_SYSTEM_PROMPT, &artifact.code, SUGGESTIONS_MODEL, &ctx)
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, "suggestions fetch failed");
                return Vec::new();
            }
        };

        let collected = suggestions::collect_suggestions(stream).await;
        session.set_suggestions(collected.clone());
        collected
    }
}

/// Returns the model to use when the caller did not pick one.
pub fn default_model() -> &'static SupportedModel {
    supported_models::default_model()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::session::{Message, SessionState};
    use appforge_interaction::agent::AgentError;
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use std::sync::Mutex;

    const MODEL: &str = "Meta-Llama-3.1-405B-Instruct";

    fn envelope(code: &str) -> String {
        format!(r#"<appArtifact name="App" icon="zap">{code}</appArtifact>"#)
    }

    /// Scripted agent double: pops canned completion results in order.
    struct ScriptedAgent {
        completions: Mutex<Vec<Result<String, AgentError>>>,
        calls: Mutex<usize>,
        stream_chunks: Vec<String>,
    }

    impl ScriptedAgent {
        fn new(completions: Vec<Result<String, AgentError>>) -> Self {
            Self {
                completions: Mutex::new(completions),
                calls: Mutex::new(0),
                stream_chunks: Vec::new(),
            }
        }

        fn with_stream(mut self, chunks: Vec<&str>) -> Self {
            self.stream_chunks = chunks.into_iter().map(String::from).collect();
            self
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionAgent for ScriptedAgent {
        async fn complete(
            &self,
            _messages: &[Message],
            _model: &str,
            _ctx: &RequestContext,
        ) -> Result<String, AgentError> {
            *self.calls.lock().unwrap() += 1;
            self.completions.lock().unwrap().remove(0)
        }
    }

    #[async_trait]
    impl StreamingAgent for ScriptedAgent {
        async fn stream_text(
            &self,
            _system: &str,
            _prompt: &str,
            _model: &str,
            _ctx: &RequestContext,
        ) -> Result<BoxStream<'static, Result<String, AgentError>>, AgentError> {
            let chunks: Vec<Result<String, AgentError>> =
                self.stream_chunks.iter().cloned().map(Ok).collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    fn usecase(agent: ScriptedAgent) -> (TurnUsecase<ScriptedAgent>, Arc<ScriptedAgent>) {
        let agent = Arc::new(agent);
        (TurnUsecase::new(agent.clone()), agent)
    }

    #[tokio::test]
    async fn successful_turn_records_history_and_displays_the_artifact() {
        let (usecase, agent) = usecase(ScriptedAgent::new(vec![Ok(envelope("const a = 1"))]));
        let mut session = Session::new("t");

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, None)
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::Completed(a) if a.code == "const a = 1"));
        assert_eq!(session.versions.len(), 1);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.state, SessionState::Displaying);
        assert_eq!(agent.call_count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_shows_error_artifact_without_history() {
        let (usecase, _) = usecase(ScriptedAgent::new(vec![Err(AgentError::Transport(
            "connection refused".into(),
        ))]));
        let mut session = Session::new("t");

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, None)
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::Failed(AppforgeError::Transport(_))));
        assert!(session.versions.is_empty());
        assert!(session.messages.is_empty());
        assert!(session.artifact.as_ref().unwrap().is_error());
        // failed turns stay usable for a retry
        assert_eq!(session.state, SessionState::Displaying);
    }

    #[tokio::test]
    async fn malformed_completion_fails_the_turn() {
        let (usecase, _) = usecase(ScriptedAgent::new(vec![Ok("no envelope here".into())]));
        let mut session = Session::new("t");

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, None)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            TurnOutcome::Failed(AppforgeError::MalformedCompletion(_))
        ));
        assert!(session.versions.is_empty());
    }

    #[tokio::test]
    async fn truncated_completion_is_repaired_within_the_turn() {
        let (usecase, agent) = usecase(ScriptedAgent::new(vec![
            Ok(r#"<appArtifact name="App" icon="zap">const a ="#.into()),
            Ok(" 1</appArtifact>".into()),
        ]));
        let mut session = Session::new("t");

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, None)
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::Completed(a) if a.code == "const a = 1"));
        // main request plus exactly one repair request
        assert_eq!(agent.call_count(), 2);
        assert_eq!(session.versions.len(), 1);
    }

    #[tokio::test]
    async fn quota_errors_park_the_session_awaiting_credential() {
        let (usecase, _) = usecase(ScriptedAgent::new(vec![Err(AgentError::QuotaExceeded(
            "rate limit".into(),
        ))]));
        let mut session = Session::new("t");

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, None)
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::CredentialRequired);
        assert_eq!(session.state, SessionState::AwaitingCredential);

        // without a credential the next submission never reaches the agent
        let outcome = usecase
            .submit(&mut session, "again", MODEL, None)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::CredentialRequired);
    }

    #[tokio::test]
    async fn credential_resubmission_unblocks_the_session() {
        let (usecase, _) = usecase(ScriptedAgent::new(vec![
            Err(AgentError::CredentialRequired(3)),
            Ok(envelope("const a = 1")),
        ]));
        let mut session = Session::new("t");

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, None)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::CredentialRequired);

        let outcome = usecase
            .submit(&mut session, "make an app", MODEL, Some("user-key".into()))
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed(_)));
        assert_eq!(session.state, SessionState::Displaying);
    }

    #[tokio::test]
    async fn revision_from_history_preview_forks_before_appending() {
        let (usecase, _) = usecase(ScriptedAgent::new(vec![
            Ok(envelope("v0")),
            Ok(envelope("v1")),
            Ok(envelope("v2")),
            Ok(envelope("v0'")),
        ]));
        let mut session = Session::new("t");
        for prompt in ["p0", "p1", "p2"] {
            usecase.submit(&mut session, prompt, MODEL, None).await.unwrap();
        }

        session.select_version(0).unwrap();
        usecase
            .submit(&mut session, "revise v0", MODEL, None)
            .await
            .unwrap();

        let contents: Vec<_> = session.versions.iter().map(|v| v.content.as_str()).collect();
        assert_eq!(contents, vec!["v0", "v0'"]);
        assert_eq!(session.messages.len(), 4);
    }

    #[tokio::test]
    async fn unknown_model_is_a_caller_error() {
        let (usecase, _) = usecase(ScriptedAgent::new(vec![]));
        let mut session = Session::new("t");
        let err = usecase
            .submit(&mut session, "x", "not-a-model", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppforgeError::Config(_)));
        assert_eq!(session.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn suggestions_are_best_effort_and_stored_on_the_session() {
        let agent = ScriptedAgent::new(vec![Ok(envelope("const a = 1"))]).with_stream(vec![
            "<suggestion>Add dark mode</suggestion>",
            "<suggestion>Add a timer</suggestion>",
        ]);
        let (usecase, _) = usecase(agent);
        let mut session = Session::new("t");
        usecase.submit(&mut session, "p", MODEL, None).await.unwrap();

        let suggestions = usecase.refresh_suggestions(&mut session, None).await;
        assert_eq!(suggestions, vec!["Add dark mode", "Add a timer"]);
        assert_eq!(session.suggestions, suggestions);

        // a new submission clears them
        session.begin_turn("next").unwrap();
        assert!(session.suggestions.is_empty());
    }
}
