use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::capability::{
    Capability, CapabilityProvider, CapabilityRequest, ChatReply, TaskSuggestion,
    TranscriptionProvider,
};
use crate::error::{OrchestratorError, Result};
use crate::intent::{classify, Intent};
use crate::pipeline::{
    compute_progress, HealthOutcome, HealthPipeline, MeetingContext, MeetingOutcome,
    MeetingPipeline, TaskContext, TaskOutcome, TaskPipeline,
};
use crate::store::{
    CacheInvalidator, ChatContext, ChatHistoryStore, ChatMessage, Project, ProjectStore, Task,
    TaskStore,
};

/// Orchestrator lifecycle. Constructed `Uninitialized`; every entry point
/// waits for a successful `initialize()` before doing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready,
}

/// Result of one chat turn, tagged by the handler that produced it.
#[derive(Debug, Clone)]
pub enum ChatResponse {
    TaskCreated(TaskOutcome),
    ProjectAnalyzed(HealthOutcome),
    Answer { content: String },
}

impl ChatResponse {
    /// The text recorded in chat history and shown to the user.
    pub fn message(&self) -> &str {
        match self {
            ChatResponse::TaskCreated(outcome) => &outcome.message,
            ChatResponse::ProjectAnalyzed(outcome) => &outcome.message,
            ChatResponse::Answer { content } => content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionOutcome {
    pub suggestions: Vec<TaskSuggestion>,
    pub message: String,
}

/// Project + tasks loaded for a chat turn. Never cached beyond the turn.
struct ProjectSnapshot {
    project: Project,
    tasks: Vec<Task>,
}

/// Root of the orchestration core. Owns lifecycle, classifies intent, routes
/// to one pipeline per entry point, and records chat history.
pub struct Orchestrator {
    provider: Arc<dyn CapabilityProvider>,
    transcriber: Arc<dyn TranscriptionProvider>,
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
    history: Arc<dyn ChatHistoryStore>,
    task_pipeline: TaskPipeline,
    health_pipeline: HealthPipeline,
    meeting_pipeline: MeetingPipeline,
    lifecycle: Mutex<Lifecycle>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        transcriber: Arc<dyn TranscriptionProvider>,
        tasks: Arc<dyn TaskStore>,
        projects: Arc<dyn ProjectStore>,
        history: Arc<dyn ChatHistoryStore>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        let task_pipeline = TaskPipeline::new(
            provider.clone(),
            tasks.clone(),
            projects.clone(),
            cache,
        );
        let health_pipeline =
            HealthPipeline::new(provider.clone(), tasks.clone(), projects.clone());
        let meeting_pipeline =
            MeetingPipeline::new(provider.clone(), transcriber.clone(), task_pipeline.clone());

        Self {
            provider,
            transcriber,
            tasks,
            projects,
            history,
            task_pipeline,
            health_pipeline,
            meeting_pipeline,
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    /// Warm up the capability backends. Idempotent: a second call while
    /// `Ready` is a no-op, and concurrent callers queue on the lifecycle
    /// lock so exactly one warm-up runs. Failure re-raises and leaves the
    /// orchestrator `Uninitialized`.
    pub async fn initialize(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        if *lifecycle == Lifecycle::Ready {
            return Ok(());
        }
        *lifecycle = Lifecycle::Initializing;
        info!(provider = self.provider.name(), "initializing AI orchestrator");

        match futures::future::try_join(self.provider.warm_up(), self.transcriber.warm_up()).await {
            Ok(_) => {
                *lifecycle = Lifecycle::Ready;
                info!("AI orchestrator ready");
                Ok(())
            }
            Err(err) => {
                *lifecycle = Lifecycle::Uninitialized;
                Err(OrchestratorError::InitializationFailed(err.to_string()))
            }
        }
    }

    pub async fn is_ready(&self) -> bool {
        *self.lifecycle.lock().await == Lifecycle::Ready
    }

    async fn ensure_initialized(&self) -> Result<()> {
        self.initialize().await
    }

    /// One conversational turn: hydrate project context, classify intent,
    /// route, then append the user/ai record pair to chat history.
    pub async fn chat(
        &self,
        user: &str,
        message: &str,
        context: &ChatContext,
    ) -> Result<ChatResponse> {
        self.ensure_initialized().await?;

        if message.trim().is_empty() {
            return Err(OrchestratorError::ValidationFailed(
                "message must not be empty".to_string(),
            ));
        }

        let snapshot = self.hydrate_context(context).await;

        let intent = classify(message);
        info!(%intent, "intent classified");

        let response = match intent {
            Intent::CreateTask => {
                let task_context = TaskContext {
                    project_id: context.project_id.clone().unwrap_or_default(),
                    user_id: context.user_id.clone(),
                    ..Default::default()
                };
                let outcome = self
                    .task_pipeline
                    .create_task_from_text(message, &task_context)
                    .await?;
                ChatResponse::TaskCreated(outcome)
            }
            Intent::AnalyzeProject => {
                let project_id = context.project_id.as_deref().ok_or_else(|| {
                    OrchestratorError::ValidationFailed(
                        "a project id is required to analyze a project".to_string(),
                    )
                })?;
                let outcome = self.health_pipeline.analyze_project(project_id).await?;
                ChatResponse::ProjectAnalyzed(outcome)
            }
            Intent::GeneralQuery => {
                let reply = self.answer_general_query(message, snapshot.as_ref()).await?;
                ChatResponse::Answer {
                    content: reply.content,
                }
            }
        };

        // Two independent appends, no transaction: a crash in between can
        // leave a user record with no ai record, and callers tolerate that.
        self.history
            .append(ChatMessage::from_user(user, message, context))
            .await?;
        self.history
            .append(ChatMessage::from_ai(user, response.message(), context))
            .await?;

        Ok(response)
    }

    pub async fn analyze_project(&self, project_id: &str) -> Result<HealthOutcome> {
        self.ensure_initialized().await?;
        self.health_pipeline.analyze_project(project_id).await
    }

    pub async fn transcribe_meeting(
        &self,
        audio_ref: &str,
        context: &MeetingContext,
    ) -> Result<MeetingOutcome> {
        self.ensure_initialized().await?;
        self.meeting_pipeline.process_recording(audio_ref, context).await
    }

    /// Break the project down into 3-5 suggested tasks, fed by the project
    /// description and the titles of existing tasks.
    pub async fn generate_task_suggestions(&self, project_id: &str) -> Result<SuggestionOutcome> {
        self.ensure_initialized().await?;

        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found("project", project_id))?;
        let tasks = self.tasks.find_by_project(project_id).await?;
        let existing: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();

        let raw = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::TaskBreakdown,
                json!({
                    "title": project.name,
                    "description": project.description,
                    "existingTasks": existing,
                }),
            ))
            .await?;
        let suggestions = TaskSuggestion::list_from_output(raw)?;

        Ok(SuggestionOutcome {
            message: format!("Generated {} task suggestions", suggestions.len()),
            suggestions,
        })
    }

    /// Best-effort context hydration: a missing project or a failing store
    /// read downgrades to "no context", never to a chat failure.
    async fn hydrate_context(&self, context: &ChatContext) -> Option<ProjectSnapshot> {
        let project_id = context.project_id.as_deref()?;

        let project = match self.projects.find_by_id(project_id).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                warn!(%project_id, "chat context references an unknown project");
                return None;
            }
            Err(err) => {
                warn!(%project_id, error = %err, "failed to load chat project context");
                return None;
            }
        };
        let tasks = match self.tasks.find_by_project(project_id).await {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(%project_id, error = %err, "failed to load chat task context");
                vec![]
            }
        };

        Some(ProjectSnapshot { project, tasks })
    }

    async fn answer_general_query(
        &self,
        message: &str,
        snapshot: Option<&ProjectSnapshot>,
    ) -> Result<ChatReply> {
        let raw = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::Chat,
                json!({
                    "system": build_system_prompt(snapshot),
                    "message": message,
                }),
            ))
            .await?;
        ChatReply::from_output(raw)
    }
}

fn build_system_prompt(snapshot: Option<&ProjectSnapshot>) -> String {
    let mut prompt =
        "You are ZenAI, an intelligent AI Product Manager assistant.".to_string();

    if let Some(snapshot) = snapshot {
        let (progress, counts) = compute_progress(&snapshot.tasks);
        prompt.push_str(&format!(
            "\n\nCurrent Project Context:\n- Project: {}\n- Status: {}\n- Total Tasks: {}\n- Completed: {}\n- Progress: {}%",
            snapshot.project.name,
            snapshot.project.status,
            counts.total_tasks,
            counts.completed_tasks,
            progress
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::{ScriptedProvider, StaticTranscriber};
    use crate::store::memory::{
        InMemoryChatHistory, InMemoryProjectStore, InMemoryTaskStore, RecordingCache,
    };
    use crate::store::{ChatRole, Priority, ProjectMetadata};

    struct Harness {
        orchestrator: Arc<Orchestrator>,
        provider: Arc<ScriptedProvider>,
        history: Arc<InMemoryChatHistory>,
    }

    async fn harness() -> Harness {
        let provider = Arc::new(ScriptedProvider::new());
        let projects = Arc::new(InMemoryProjectStore::new());
        projects
            .insert(Project {
                id: "proj-1".to_string(),
                name: "Mobile App".to_string(),
                description: "Customer-facing mobile app".to_string(),
                status: "active".to_string(),
                priority: Priority::High,
                progress: 0,
                metadata: ProjectMetadata::default(),
            })
            .await;
        let history = Arc::new(InMemoryChatHistory::new());
        let orchestrator = Arc::new(Orchestrator::new(
            provider.clone(),
            Arc::new(StaticTranscriber::with_text("standup notes")),
            Arc::new(InMemoryTaskStore::new()),
            projects,
            history.clone(),
            Arc::new(RecordingCache::new()),
        ));
        Harness {
            orchestrator,
            provider,
            history,
        }
    }

    fn context_for_project() -> ChatContext {
        ChatContext {
            project_id: Some("proj-1".to_string()),
            user_id: Some("user-1".to_string()),
        }
    }

    #[tokio::test]
    async fn concurrent_initialize_warms_up_once() {
        let h = harness().await;
        let a = h.orchestrator.clone();
        let b = h.orchestrator.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.initialize().await }),
            tokio::spawn(async move { b.initialize().await }),
        );
        first.unwrap().unwrap();
        second.unwrap().unwrap();

        assert_eq!(h.provider.warm_up_count(), 1);
        assert!(h.orchestrator.is_ready().await);

        // And a later call is a plain no-op.
        h.orchestrator.initialize().await.unwrap();
        assert_eq!(h.provider.warm_up_count(), 1);
    }

    #[tokio::test]
    async fn failed_initialization_leaves_orchestrator_uninitialized() {
        let h = harness().await;
        h.provider.fail_warm_up();

        let err = h.orchestrator.initialize().await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InitializationFailed(_)));
        assert!(!h.orchestrator.is_ready().await);

        // Entry points are guarded by the same initialization.
        let err = h
            .orchestrator
            .chat("user-1", "hello", &ChatContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InitializationFailed(_)));
    }

    #[tokio::test]
    async fn chat_routes_task_creation_and_records_history() {
        let h = harness().await;
        h.provider.script(
            Capability::TaskExtraction,
            serde_json::json!({
                "title": "Fix login bug",
                "description": "Fix the login bug",
                "priority": "urgent",
                "estimatedTime": 2,
                "tags": ["bug"]
            }),
        );
        h.provider.script(
            Capability::TaskAnalysis,
            serde_json::json!({"complexityScore": 4, "estimatedHours": 3}),
        );

        let response = h
            .orchestrator
            .chat("user-1", "create a task to fix the login bug", &context_for_project())
            .await
            .unwrap();

        let ChatResponse::TaskCreated(outcome) = &response else {
            panic!("expected task creation, got {:?}", response);
        };
        assert_eq!(outcome.task.estimated_time, 3.0);

        let messages = h.history.recent("user-1", 10).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
        assert_eq!(messages[1].role, ChatRole::Ai);
        assert_eq!(messages[1].content, outcome.message);
    }

    #[tokio::test]
    async fn chat_answers_general_queries_with_project_context() {
        let h = harness().await;
        h.provider.script(
            Capability::Chat,
            serde_json::json!({"content": "You have no overdue work."}),
        );

        let response = h
            .orchestrator
            .chat("user-1", "anything I should worry about?", &context_for_project())
            .await
            .unwrap();
        assert_eq!(response.message(), "You have no overdue work.");
        assert_eq!(h.provider.invocations(), vec![Capability::Chat]);
    }

    #[tokio::test]
    async fn chat_tolerates_unknown_project_in_context() {
        let h = harness().await;
        h.provider.script(
            Capability::Chat,
            serde_json::json!({"content": "Hello!"}),
        );

        let context = ChatContext {
            project_id: Some("missing".to_string()),
            user_id: None,
        };
        let response = h.orchestrator.chat("user-1", "hi", &context).await.unwrap();
        assert_eq!(response.message(), "Hello!");
    }

    #[tokio::test]
    async fn analyze_intent_without_project_id_fails_validation() {
        let h = harness().await;
        let err = h
            .orchestrator
            .chat("user-1", "give me a status summary", &ChatContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ValidationFailed(_)));
        assert!(h.provider.invocations().is_empty());
    }

    #[tokio::test]
    async fn suggestions_use_breakdown_capability() {
        let h = harness().await;
        h.provider.script(
            Capability::TaskBreakdown,
            serde_json::json!([
                {"title": "Set up CI", "description": "Pipeline for tests", "estimatedTime": 4, "priority": "medium"},
                {"title": "Write onboarding docs", "estimatedTime": 2, "priority": "low"}
            ]),
        );

        let outcome = h
            .orchestrator
            .generate_task_suggestions("proj-1")
            .await
            .unwrap();
        assert_eq!(outcome.suggestions.len(), 2);
        assert_eq!(outcome.message, "Generated 2 task suggestions");
    }

    #[tokio::test]
    async fn suggestions_for_unknown_project_are_not_found() {
        let h = harness().await;
        let err = h
            .orchestrator
            .generate_task_suggestions("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound { kind: "project", .. }));
        assert!(h.provider.invocations().is_empty());
    }

    #[test]
    fn system_prompt_includes_hydrated_progress() {
        let snapshot = ProjectSnapshot {
            project: Project {
                id: "proj-1".to_string(),
                name: "Mobile App".to_string(),
                description: String::new(),
                status: "active".to_string(),
                priority: Priority::High,
                progress: 0,
                metadata: ProjectMetadata::default(),
            },
            tasks: vec![],
        };
        let prompt = build_system_prompt(Some(&snapshot));
        assert!(prompt.contains("Project: Mobile App"));
        assert!(prompt.contains("Progress: 0%"));
        assert!(build_system_prompt(None).ends_with("assistant."));
    }
}
