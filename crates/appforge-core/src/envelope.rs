//! Envelope wire-format parser.
//!
//! The model is instructed to wrap its output in a single tag pair:
//!
//! ```text
//! <appArtifact name="APP_NAME" icon="ICON_NAME">
//! ...component source...
//! </appArtifact>
//! ```
//!
//! This module turns a raw completion into that structure, tolerating the
//! malformations models actually emit: stray markdown fences, literally
//! escaped newlines, missing attributes, and injected `<script>` blocks.
//! It is a pure function; the single repair round trip for truncated
//! output is owned by the extractor that calls it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The envelope tag name. Shared by the prompt composer (instructions) and
/// the parser (extraction) so the two sides can never drift.
pub const ENVELOPE_TAG: &str = "appArtifact";

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<appArtifact\b([^>]*)>").expect("open tag regex"));
static NAME_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name\s*=\s*"([^"]*)""#).expect("name attr regex"));
static ICON_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"icon\s*=\s*"([^"]*)""#).expect("icon attr regex"));
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("script block regex"));
static SCRIPT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?script\b[^>]*>").expect("script tag regex"));

/// Closing marker literal.
const CLOSE_TAG: &str = "</appArtifact>";

/// A successfully parsed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Component source between the markers, trimmed and unescaped.
    pub code: String,
    /// `name` attribute of the opening marker; `""` when absent.
    pub name: String,
    /// `icon` attribute of the opening marker; `""` when absent.
    pub icon: String,
}

/// Why a completion failed to parse.
///
/// `Unterminated` is the one recoverable kind: the caller may issue a
/// single follow-up completion and re-parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// No opening marker anywhere in the text. JSON or prose responses
    /// land here; the system never guesses a component from unstructured
    /// text.
    #[error("completion contains no {ENVELOPE_TAG} envelope")]
    MissingEnvelope,
    /// Opening marker present, closing marker missing (truncated
    /// generation).
    #[error("envelope is unterminated (missing {CLOSE_TAG})")]
    Unterminated,
    /// Envelope present but the code body was empty after trimming.
    #[error("envelope body is empty")]
    EmptyBody,
}

/// Parses a raw completion into an [`Envelope`].
pub fn parse_envelope(raw: &str) -> Result<Envelope, EnvelopeError> {
    let text = strip_code_fences(raw);
    let text = unescape_literal_newlines(&text);

    let open = OPEN_TAG
        .captures(&text)
        .ok_or(EnvelopeError::MissingEnvelope)?;
    let attrs = open.get(1).map(|m| m.as_str()).unwrap_or("");
    // Missing attributes default to empty, not a hard failure.
    let name = capture_attr(&NAME_ATTR, attrs);
    let icon = capture_attr(&ICON_ATTR, attrs);

    let body_start = open.get(0).expect("whole match").end();
    let body_end = text[body_start..]
        .find(CLOSE_TAG)
        .map(|offset| body_start + offset)
        .ok_or(EnvelopeError::Unterminated)?;

    let body = strip_script_blocks(&text[body_start..body_end]);
    let code = body.trim();
    if code.is_empty() {
        return Err(EnvelopeError::EmptyBody);
    }

    Ok(Envelope {
        code: code.to_string(),
        name,
        icon,
    })
}

/// Returns true if the text contains the opening marker (used to decide
/// whether repair output is a full re-emission or a continuation).
pub fn has_open_marker(text: &str) -> bool {
    OPEN_TAG.is_match(text)
}

/// Strips leading/trailing markdown code-fence markers. Idempotent:
/// applying it to already-stripped text is a no-op.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the fence line, language tag included
        text = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

/// Un-escapes completions where the model encoded every newline literally
/// (one long line full of `\n` sequences). Text that already contains real
/// newlines is left alone.
fn unescape_literal_newlines(text: &str) -> String {
    if !text.contains('\n') && text.contains("\\n") {
        text.replace("\\n", "\n")
    } else {
        text.to_string()
    }
}

/// Removes embedded `<script>` blocks, tags and content both.
///
/// Best-effort sanitization only, not a security boundary: the rendering
/// sandbox still executes whatever is returned.
fn strip_script_blocks(body: &str) -> String {
    let without_blocks = SCRIPT_BLOCK.replace_all(body, "");
    SCRIPT_TAG.replace_all(&without_blocks, "").into_owned()
}

fn capture_attr(pattern: &Regex, attrs: &str) -> String {
    pattern
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
