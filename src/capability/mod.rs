use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{OrchestratorError, Result};
use crate::store::Priority;

pub mod demo;

/// Closed set of capabilities the orchestration core can ask a provider for.
/// Callers select by variant, never by dynamic name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TaskExtraction,
    TaskAnalysis,
    ProjectHealth,
    TaskBreakdown,
    Transcription,
    Summarization,
    ActionItemExtraction,
    Chat,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TaskExtraction => "task-extraction",
            Capability::TaskAnalysis => "task-analysis",
            Capability::ProjectHealth => "project-health",
            Capability::TaskBreakdown => "task-breakdown",
            Capability::Transcription => "transcription",
            Capability::Summarization => "summarization",
            Capability::ActionItemExtraction => "action-item-extraction",
            Capability::Chat => "chat",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured request to a capability provider.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityRequest {
    pub capability: Capability,
    pub input: Value,
}

impl CapabilityRequest {
    pub fn new(capability: Capability, input: Value) -> Self {
        Self { capability, input }
    }
}

/// Errors raised by capability and transcription backends. These are not
/// retried at this layer; retry policy belongs to the provider itself.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("capability not supported: {0}")]
    Unsupported(Capability),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("network error: {0}")]
    Network(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Main trait that all capability providers must implement. One invocation
/// is one blocking remote call to a language-model backend; the raw output
/// is untrusted until a typed payload validates it.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Get provider name
    fn name(&self) -> &str;

    /// Perform one capability call and return its raw structured output.
    async fn invoke(&self, request: CapabilityRequest) -> std::result::Result<Value, ProviderError>;

    /// Optional warm-up performed during orchestrator initialization.
    async fn warm_up(&self) -> std::result::Result<(), ProviderError> {
        Ok(())
    }
}

/// Transcription backend contract (Whisper or compatible).
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(
        &self,
        audio_ref: &str,
        language: Option<&str>,
    ) -> std::result::Result<Transcript, ProviderError>;

    async fn warm_up(&self) -> std::result::Result<(), ProviderError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    pub duration: f64,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Deserialize a raw capability output, mapping any shape mismatch to
/// `MalformedCapabilityOutput` for the given capability.
pub(crate) fn decode<T: DeserializeOwned>(capability: Capability, raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|err| OrchestratorError::malformed(capability, err.to_string()))
}

/// Structured draft produced by the task-extraction capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub estimated_time: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TaskDraft {
    pub fn from_output(raw: Value) -> Result<Self> {
        let draft: TaskDraft = decode(Capability::TaskExtraction, raw)?;
        if draft.title.trim().is_empty() {
            return Err(OrchestratorError::malformed(
                Capability::TaskExtraction,
                "title must not be empty",
            ));
        }
        Ok(draft)
    }
}

/// Complexity/effort estimate produced by the task-analysis capability.
/// Its `estimated_hours` and `complexity_score` are authoritative over the
/// extraction-stage estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalysis {
    pub complexity_score: i32,
    pub estimated_hours: f64,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl TaskAnalysis {
    pub fn from_output(raw: Value) -> Result<Self> {
        let analysis: TaskAnalysis = decode(Capability::TaskAnalysis, raw)?;
        if !(1..=10).contains(&analysis.complexity_score) {
            return Err(OrchestratorError::malformed(
                Capability::TaskAnalysis,
                format!("complexityScore {} out of range 1-10", analysis.complexity_score),
            ));
        }
        if analysis.estimated_hours < 0.0 {
            return Err(OrchestratorError::malformed(
                Capability::TaskAnalysis,
                "estimatedHours must be non-negative",
            ));
        }
        Ok(analysis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    Healthy,
    AtRisk,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::AtRisk => "at-risk",
            HealthStatus::Critical => "critical",
        }
    }
}

/// Structured assessment produced by the project-health capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHealth {
    pub health_score: i32,
    pub status: HealthStatus,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl ProjectHealth {
    pub fn from_output(raw: Value) -> Result<Self> {
        let health: ProjectHealth = decode(Capability::ProjectHealth, raw)?;
        if !(0..=100).contains(&health.health_score) {
            return Err(OrchestratorError::malformed(
                Capability::ProjectHealth,
                format!("healthScore {} out of range 0-100", health.health_score),
            ));
        }
        Ok(health)
    }
}

/// Structured meeting summary produced by the summarization capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSummary {
    pub executive_summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl MeetingSummary {
    pub fn from_output(raw: Value) -> Result<Self> {
        decode(Capability::Summarization, raw)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// One action item lifted out of a meeting transcript. Transient: it feeds
/// the task pipeline and is never persisted itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub action: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: ActionPriority,
}

impl ActionItem {
    pub fn list_from_output(raw: Value) -> Result<Vec<Self>> {
        decode(Capability::ActionItemExtraction, raw)
    }
}

/// One suggested task from the task-breakdown capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub estimated_time: f64,
    pub priority: Priority,
}

impl TaskSuggestion {
    pub fn list_from_output(raw: Value) -> Result<Vec<Self>> {
        let suggestions: Vec<TaskSuggestion> = decode(Capability::TaskBreakdown, raw)?;
        for suggestion in &suggestions {
            if suggestion.title.trim().is_empty() {
                return Err(OrchestratorError::malformed(
                    Capability::TaskBreakdown,
                    "suggestion title must not be empty",
                ));
            }
        }
        Ok(suggestions)
    }
}

/// Free-form chat reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
}

impl ChatReply {
    pub fn from_output(raw: Value) -> Result<Self> {
        decode(Capability::Chat, raw)
    }
}
