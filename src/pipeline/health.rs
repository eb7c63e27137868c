use serde_json::json;
use std::sync::Arc;

use crate::capability::{Capability, CapabilityProvider, CapabilityRequest, ProjectHealth};
use crate::error::{OrchestratorError, Result};
use crate::pipeline::task::compute_progress;
use crate::store::{ProjectStore, TaskStore};

#[derive(Debug, Clone)]
pub struct HealthOutcome {
    pub health: ProjectHealth,
    pub message: String,
}

/// Aggregates a project's tasks and asks the project-health capability for a
/// structured assessment. Pure pass-through of the capability output plus a
/// deterministic digest.
#[derive(Clone)]
pub struct HealthPipeline {
    provider: Arc<dyn CapabilityProvider>,
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
}

impl HealthPipeline {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        tasks: Arc<dyn TaskStore>,
        projects: Arc<dyn ProjectStore>,
    ) -> Self {
        Self {
            provider,
            tasks,
            projects,
        }
    }

    pub async fn analyze_project(&self, project_id: &str) -> Result<HealthOutcome> {
        // Project must resolve before anything is spent on a capability call.
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| OrchestratorError::not_found("project", project_id))?;
        let tasks = self.tasks.find_by_project(project_id).await?;
        let (_, counts) = compute_progress(&tasks);

        let raw = self
            .provider
            .invoke(CapabilityRequest::new(
                Capability::ProjectHealth,
                json!({
                    "project": {
                        "name": project.name,
                        "status": project.status,
                        "priority": project.priority,
                    },
                    "taskCounts": {
                        "total": counts.total_tasks,
                        "completed": counts.completed_tasks,
                        "inProgress": counts.in_progress_tasks,
                    },
                }),
            ))
            .await?;
        let health = ProjectHealth::from_output(raw)?;

        Ok(HealthOutcome {
            message: render_digest(&health),
            health,
        })
    }
}

/// Human-readable digest: status line, score, then one bullet per insight in
/// the order the capability returned them.
fn render_digest(health: &ProjectHealth) -> String {
    let insights = health
        .insights
        .iter()
        .map(|insight| format!("• {}", insight))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📊 Project Health: {}\nScore: {}/100\n\nKey Insights:\n{}",
        health.status.as_str().to_uppercase(),
        health.health_score,
        insights
    )
}
