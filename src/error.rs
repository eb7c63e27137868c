use crate::capability::{Capability, ProviderError};

/// Error taxonomy for the orchestration core. Every pipeline-level failure
/// surfaces through one of these variants; nothing is downgraded on the way
/// up except per-action-item failures in the meeting pipeline and cache
/// invalidation failures, which are logged and swallowed at the call site.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("capability provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("malformed {capability} output: {reason}")]
    MalformedCapabilityOutput {
        capability: Capability,
        reason: String,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("initialization failed: {0}")]
    InitializationFailed(String),
}

impl OrchestratorError {
    pub(crate) fn malformed(capability: Capability, reason: impl Into<String>) -> Self {
        Self::MalformedCapabilityOutput {
            capability,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
