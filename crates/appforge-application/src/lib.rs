//! appforge-application: use-case orchestration over the engine core.
//!
//! - `turn_usecase`: the full generate/revise turn (gate, compose,
//!   complete, extract, state transitions) plus suggestion refresh
//! - `publish_service`: publish/fetch of finished apps and image staging
//! - `bootstrap`: wires configuration and secrets into a live agent

pub mod bootstrap;
pub mod publish_service;
pub mod turn_usecase;

pub use bootstrap::build_agent;
pub use publish_service::PublishService;
pub use turn_usecase::{TurnOutcome, TurnUsecase};
