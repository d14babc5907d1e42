//! Wires configuration and secrets into a live completion agent.

use appforge_infrastructure::{ConfigService, SecretService};
use appforge_interaction::ChatApiAgent;
use std::time::Duration;

/// Builds a [`ChatApiAgent`] from the on-disk configuration and stored
/// credential. Missing files fall back to defaults; a missing credential
/// leaves the agent on the free-turn gate.
pub fn build_agent(config_service: &ConfigService, secret_service: &SecretService) -> ChatApiAgent {
    let config = config_service.get_config();
    let api_key = secret_service.api_key();
    if api_key.is_none() {
        tracing::debug!("no stored credential, free-turn gate active");
    }
    ChatApiAgent::new(config.base_url, api_key)
        .with_free_turn_limit(config.free_turn_limit)
        .with_timeout(Duration::from_secs(config.request_timeout_secs))
}
