//! Suggestions Stream Processor.
//!
//! Parses a token-streamed response into discrete suggestion strings as
//! they arrive, without waiting for the full completion. Strictly
//! best-effort: the primary artifact flow never depends on this module.

use crate::agent::AgentError;
use futures::{Stream, StreamExt};

/// Maximum number of suggestions surfaced per turn.
pub const MAX_SUGGESTIONS: usize = 5;

/// Buffer cap: an unterminated span longer than this is sacrificed rather
/// than letting the buffer grow without limit.
const BUFFER_CAP: usize = 4096;

const OPEN_MARKER: &str = "<suggestion>";
const CLOSE_MARKER: &str = "</suggestion>";

/// System prompt for the streamed suggestions call.
pub const SUGGESTIONS_SYSTEM_PROMPT: &str = "You are a suggestions engine. You will be given \
the source of a generated app and you will return up to 5 short improvement suggestions. Wrap \
every suggestion in <suggestion>...</suggestion> tags. Return nothing outside the tags.";

/// Incremental parser over an accumulating buffer.
///
/// Each `push` scans for complete marker pairs, emits the enclosed
/// suggestions, and removes the consumed spans (markers included), leaving
/// any remainder for the next chunk.
#[derive(Debug, Default)]
pub struct SuggestionStreamProcessor {
    buffer: String,
}

impl SuggestionStreamProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one stream chunk; returns the suggestions it completed.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut emitted = Vec::new();
        loop {
            let Some(start) = self.buffer.find(OPEN_MARKER) else {
                break;
            };
            let body_start = start + OPEN_MARKER.len();
            let Some(close) = self.buffer[body_start..].find(CLOSE_MARKER) else {
                break;
            };

            let suggestion = self.buffer[body_start..body_start + close].trim().to_string();
            if !suggestion.is_empty() {
                emitted.push(suggestion);
            }
            self.buffer.drain(..body_start + close + CLOSE_MARKER.len());
        }

        // Bound memory when no pair ever completes: drop the oldest half,
        // keeping enough tail for a marker spanning the cut to finish.
        if self.buffer.len() > BUFFER_CAP {
            let mut cut = self.buffer.len() - BUFFER_CAP / 2;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
        }

        emitted
    }
}

/// Drains a completion stream into a suggestion list.
///
/// Stops at `MAX_SUGGESTIONS`; a stream error ends collection with
/// whatever was parsed so far (best-effort); any trailing unterminated
/// fragment is discarded.
pub async fn collect_suggestions<S>(mut stream: S) -> Vec<String>
where
    S: Stream<Item = Result<String, AgentError>> + Unpin,
{
    let mut processor = SuggestionStreamProcessor::new();
    let mut suggestions = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(text) => {
                suggestions.extend(processor.push(&text));
                if suggestions.len() >= MAX_SUGGESTIONS {
                    suggestions.truncate(MAX_SUGGESTIONS);
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "suggestion stream failed, keeping partial results");
                break;
            }
        }
    }

    suggestions
}
