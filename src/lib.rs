pub mod capability;
pub mod config;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod pipeline;
pub mod store;

pub use config::AiConfig;
pub use error::{OrchestratorError, Result};
pub use orchestrator::{ChatResponse, Orchestrator};
