use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::capability::{Capability, CapabilityProvider, CapabilityRequest, TaskAnalysis, TaskDraft};
use crate::error::{OrchestratorError, Result};
use crate::store::{
    CacheInvalidator, ProjectMetadata, ProjectStore, Task, TaskStatus, TaskStore,
};

/// Per-call context for task creation: which project the task belongs to and
/// optional hints carried over from the caller (meeting action items pass
/// owner/due-date through here).
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    pub project_id: String,
    pub user_id: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task: Task,
    pub analysis: TaskAnalysis,
    pub message: String,
}

/// Turns a natural-language description into a persisted task: extraction
/// drafts it, analysis prices it, the store keeps it, and the owning
/// project's progress is recomputed afterwards.
#[derive(Clone)]
pub struct TaskPipeline {
    provider: Arc<dyn CapabilityProvider>,
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl TaskPipeline {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        tasks: Arc<dyn TaskStore>,
        projects: Arc<dyn ProjectStore>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            provider,
            tasks,
            projects,
            cache,
        }
    }

    pub async fn create_task_from_text(
        &self,
        description: &str,
        context: &TaskContext,
    ) -> Result<TaskOutcome> {
        if description.trim().is_empty() {
            return Err(OrchestratorError::ValidationFailed(
                "task description must not be empty".to_string(),
            ));
        }
        if context.project_id.trim().is_empty() {
            return Err(OrchestratorError::ValidationFailed(
                "a project id is required to create a task".to_string(),
            ));
        }

        // Resolve the project up front so a bad reference never costs a
        // capability call and never leaves a partial task behind.
        self.projects
            .find_by_id(&context.project_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found("project", &context.project_id))?;

        let raw_draft = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::TaskExtraction,
                json!({
                    "description": description,
                    "projectId": context.project_id,
                }),
            ))
            .await?;
        let draft = TaskDraft::from_output(raw_draft)?;

        let raw_analysis = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::TaskAnalysis,
                json!({
                    "task": draft,
                    "context": {
                        "projectId": context.project_id,
                        "userId": context.user_id,
                    },
                }),
            ))
            .await?;
        let analysis = TaskAnalysis::from_output(raw_analysis)?;

        // The analysis estimate is authoritative; the extraction-stage
        // estimate is discarded on merge.
        let task = Task {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: draft.title,
            description: draft.description,
            project: context.project_id.clone(),
            priority: draft.priority,
            estimated_time: analysis.estimated_hours,
            complexity: Some(analysis.complexity_score),
            tags: draft.tags,
            assignee: context.assignee.clone(),
            due_date: context.due_date.clone(),
            status: TaskStatus::Todo,
            created_by: context.user_id.clone(),
        };

        let task = self.tasks.create(task).await?;
        info!(task_id = %task.id, project_id = %task.project, "task created");

        self.refresh_project_progress(&context.project_id).await?;

        let message = format!(
            "✅ Task created successfully! Estimated effort: {} hours. Complexity: {}/10.",
            analysis.estimated_hours, analysis.complexity_score
        );

        Ok(TaskOutcome {
            task,
            analysis,
            message,
        })
    }

    /// Recompute the project's derived progress from the full task set and
    /// write it back. Cache invalidation afterwards is best-effort.
    pub async fn refresh_project_progress(&self, project_id: &str) -> Result<()> {
        let tasks = self.tasks.find_by_project(project_id).await?;
        let (progress, metadata) = compute_progress(&tasks);
        self.projects
            .update_progress(project_id, progress, metadata)
            .await?;

        if let Err(err) = self.cache.invalidate("projects:*").await {
            warn!(%project_id, error = %err, "cache invalidation failed");
        }
        Ok(())
    }
}

/// Derive a project's progress percentage and task counters from the current
/// task statuses. Idempotent: any caller recomputing from the same task set
/// gets the same value.
pub fn compute_progress(tasks: &[Task]) -> (i32, ProjectMetadata) {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    let in_progress = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count();

    let progress = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as i32
    };

    (
        progress,
        ProjectMetadata {
            total_tasks: total,
            completed_tasks: completed,
            in_progress_tasks: in_progress,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::ScriptedProvider;
    use crate::store::memory::{InMemoryProjectStore, InMemoryTaskStore, RecordingCache};
    use crate::store::{Priority, Project};
    use serde_json::json;

    fn sample_project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: "Mobile App".to_string(),
            description: "Customer-facing mobile app".to_string(),
            status: "active".to_string(),
            priority: Priority::High,
            progress: 0,
            metadata: ProjectMetadata::default(),
        }
    }

    async fn pipeline_with(
        provider: Arc<ScriptedProvider>,
    ) -> (TaskPipeline, Arc<InMemoryTaskStore>, Arc<RecordingCache>) {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let projects = Arc::new(InMemoryProjectStore::new());
        projects.insert(sample_project("proj-1")).await;
        let cache = Arc::new(RecordingCache::new());
        let pipeline = TaskPipeline::new(provider, tasks.clone(), projects, cache.clone());
        (pipeline, tasks, cache)
    }

    #[tokio::test]
    async fn analysis_estimate_overrides_extraction_estimate() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script(
            Capability::TaskExtraction,
            json!({
                "title": "Fix login bug",
                "description": "fix the login bug, urgent, 2 hours",
                "priority": "urgent",
                "estimatedTime": 2,
                "tags": ["bug"]
            }),
        );
        provider.script(
            Capability::TaskAnalysis,
            json!({"complexityScore": 4, "estimatedHours": 3}),
        );

        let (pipeline, _, cache) = pipeline_with(provider).await;
        let context = TaskContext {
            project_id: "proj-1".to_string(),
            ..Default::default()
        };
        let outcome = pipeline
            .create_task_from_text("fix the login bug, urgent, 2 hours", &context)
            .await
            .unwrap();

        assert_eq!(outcome.task.estimated_time, 3.0);
        assert_eq!(outcome.task.complexity, Some(4));
        assert_eq!(outcome.task.priority, Priority::Urgent);
        assert_eq!(cache.invalidated().await, vec!["projects:*".to_string()]);
    }

    #[tokio::test]
    async fn malformed_extraction_persists_nothing() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.script(Capability::TaskExtraction, json!({"priority": "high"}));

        let (pipeline, tasks, _) = pipeline_with(provider).await;
        let context = TaskContext {
            project_id: "proj-1".to_string(),
            ..Default::default()
        };
        let err = pipeline
            .create_task_from_text("do the thing", &context)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::MalformedCapabilityOutput { .. }
        ));
        assert!(tasks.find_by_project("proj-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_project_fails_before_any_capability_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let (pipeline, _, _) = pipeline_with(provider.clone()).await;
        let context = TaskContext {
            project_id: "missing".to_string(),
            ..Default::default()
        };
        let err = pipeline
            .create_task_from_text("do the thing", &context)
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::NotFound { kind: "project", .. }));
        assert!(provider.invocations().is_empty());
    }

    #[test]
    fn progress_is_zero_for_empty_task_set() {
        let (progress, metadata) = compute_progress(&[]);
        assert_eq!(progress, 0);
        assert_eq!(metadata.total_tasks, 0);
    }

    #[test]
    fn progress_rounds_from_status_counts() {
        let task = |status| Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: "t".to_string(),
            description: String::new(),
            project: "p".to_string(),
            priority: Priority::Low,
            estimated_time: 1.0,
            complexity: None,
            tags: vec![],
            assignee: None,
            due_date: None,
            status,
            created_by: None,
        };
        let tasks = vec![
            task(TaskStatus::Done),
            task(TaskStatus::InProgress),
            task(TaskStatus::Todo),
        ];
        let (progress, metadata) = compute_progress(&tasks);
        assert_eq!(progress, 33);
        assert_eq!(metadata.completed_tasks, 1);
        assert_eq!(metadata.in_progress_tasks, 1);
        assert_eq!(metadata.total_tasks, 3);
    }
}
