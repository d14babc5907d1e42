//! Supported LLM model catalog.
//!
//! | Model ID | Notes |
//! |----------|-------|
//! | `Meta-Llama-3.1-405B-Instruct` | Largest, best code quality (default) |
//! | `Meta-Llama-3.1-70B-Instruct` | Balanced |
//! | `Meta-Llama-3.2-3B-Instruct` | Fast, used for auxiliary calls |
//! | `Llama-3.2-90B-Vision-Instruct` | The only vision-capable entry |
//!
//! When a provider releases a new model, add a row here and an entry to
//! `SUPPORTED_MODELS`; the composer reads `is_vision_enabled` to decide
//! whether image parts may reach the model.

use serde::Serialize;

/// One selectable model with its capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedModel {
    /// Display name shown to the user.
    pub name: &'static str,
    /// Provider model identifier sent on the wire.
    pub value: &'static str,
    /// Whether the model accepts image content parts in its input.
    pub is_vision_enabled: bool,
}

/// The fixed model catalog.
pub const SUPPORTED_MODELS: &[SupportedModel] = &[
    SupportedModel {
        name: "Meta Llama 3.1 405B Instruct",
        value: "Meta-Llama-3.1-405B-Instruct",
        is_vision_enabled: false,
    },
    SupportedModel {
        name: "Meta Llama 3.1 70B Instruct",
        value: "Meta-Llama-3.1-70B-Instruct",
        is_vision_enabled: false,
    },
    SupportedModel {
        name: "Meta Llama 3.2 3B Instruct",
        value: "Meta-Llama-3.2-3B-Instruct",
        is_vision_enabled: false,
    },
    SupportedModel {
        name: "Llama 3.2 90B Vision Instruct",
        value: "Llama-3.2-90B-Vision-Instruct",
        is_vision_enabled: true,
    },
];

/// Model used for the streamed suggestions call (small and fast; the
/// suggestions flow is best-effort).
pub const SUGGESTIONS_MODEL: &str = "Meta-Llama-3.2-3B-Instruct";

/// The default generation model.
pub fn default_model() -> &'static SupportedModel {
    &SUPPORTED_MODELS[0]
}

/// Looks up a model by its wire identifier.
pub fn find_model(value: &str) -> Option<&'static SupportedModel> {
    SUPPORTED_MODELS.iter().find(|m| m.value == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vision_flag_is_set_only_on_the_vision_model() {
        let vision: Vec<_> = SUPPORTED_MODELS
            .iter()
            .filter(|m| m.is_vision_enabled)
            .collect();
        assert_eq!(vision.len(), 1);
        assert_eq!(vision[0].value, "Llama-3.2-90B-Vision-Instruct");
    }

    #[test]
    fn lookup_by_wire_id() {
        assert!(find_model("Meta-Llama-3.1-405B-Instruct").is_some());
        assert!(find_model("gpt-unknown").is_none());
    }
}
