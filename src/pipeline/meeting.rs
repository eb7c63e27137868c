use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::capability::{
    ActionItem, Capability, CapabilityProvider, CapabilityRequest, MeetingSummary, Transcript,
    TranscriptionProvider,
};
use crate::error::{OrchestratorError, Result};
use crate::pipeline::task::{TaskContext, TaskPipeline};
use crate::store::Task;

/// Per-call context for meeting processing. Created tasks land in
/// `project_id`; `title` and `language` are passed through to the backends.
#[derive(Debug, Clone, Default)]
pub struct MeetingContext {
    pub project_id: String,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MeetingOutcome {
    pub transcription: Transcript,
    pub summary: MeetingSummary,
    pub action_items: Vec<ActionItem>,
    pub created_tasks: Vec<Task>,
    /// Action text of every item whose task creation failed. Partial success
    /// is a normal, reportable outcome, not an error.
    pub failed_actions: Vec<String>,
    pub message: String,
}

/// Linear meeting pipeline: transcribe, summarize, extract action items,
/// then fan each item into the task pipeline with per-item failure
/// isolation.
#[derive(Clone)]
pub struct MeetingPipeline {
    provider: Arc<dyn CapabilityProvider>,
    transcriber: Arc<dyn TranscriptionProvider>,
    tasks: TaskPipeline,
}

impl MeetingPipeline {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        transcriber: Arc<dyn TranscriptionProvider>,
        tasks: TaskPipeline,
    ) -> Self {
        Self {
            provider,
            transcriber,
            tasks,
        }
    }

    pub async fn process_recording(
        &self,
        audio_ref: &str,
        context: &MeetingContext,
    ) -> Result<MeetingOutcome> {
        // Nothing useful can happen without a transcript.
        let transcription = self
            .transcriber
            .transcribe(audio_ref, context.language.as_deref())
            .await
            .map_err(|err| OrchestratorError::TranscriptionFailed(err.to_string()))?;
        info!(duration = transcription.duration, "meeting transcribed");

        let raw_summary = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::Summarization,
                json!({
                    "title": context.title.as_deref().unwrap_or("Team Meeting"),
                    "transcript": transcription.text,
                }),
            ))
            .await?;
        let summary = MeetingSummary::from_output(raw_summary)?;

        let raw_items = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::ActionItemExtraction,
                json!({"transcript": transcription.text}),
            ))
            .await?;
        let action_items = ActionItem::list_from_output(raw_items)?;

        // Sequential on purpose: failure diagnostics stay deterministic and
        // progress recomputation never races itself on the same project.
        let mut created_tasks = Vec::new();
        let mut failed_actions = Vec::new();
        for item in &action_items {
            if item.action.trim().is_empty() {
                continue;
            }
            let task_context = TaskContext {
                project_id: context.project_id.clone(),
                user_id: context.user_id.clone(),
                assignee: item.owner.clone(),
                due_date: item.due_date.clone(),
            };
            match self
                .tasks
                .create_task_from_text(&item.action, &task_context)
                .await
            {
                Ok(outcome) => created_tasks.push(outcome.task),
                Err(err) => {
                    warn!(action = %item.action, error = %err, "failed to create task from action item");
                    failed_actions.push(item.action.clone());
                }
            }
        }

        let message = format!(
            "Meeting processed successfully! {} action items identified, {} tasks created.",
            action_items.len(),
            created_tasks.len()
        );

        Ok(MeetingOutcome {
            transcription,
            summary,
            action_items,
            created_tasks,
            failed_actions,
            message,
        })
    }
}
