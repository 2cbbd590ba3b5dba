pub mod capability;
pub mod content;
pub mod dto;
pub mod error;
pub mod key;
pub mod prompt;
pub mod request;
pub mod service;

pub use capability::Capability;
pub use content::{Artifact, Content};
pub use dto::GenerationResponse;
pub use error::GenerationError;
pub use key::CacheKey;
pub use prompt::Prompt;
pub use request::GenerationRequest;
pub use service::{GenerationResult, Orchestrator, OrchestratorApi};
