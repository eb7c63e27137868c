use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// A persisted work-item. Created by the task pipeline or directly by a
/// caller; the store owns it, the core only borrows it per operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub project: String,
    pub priority: Priority,
    pub estimated_time: f64,
    pub complexity: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub status: TaskStatus,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: String,
    pub priority: Priority,
    /// Derived percentage, recomputed from task statuses after every task
    /// mutation. Never incrementally maintained.
    pub progress: i32,
    pub metadata: ProjectMetadata,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

/// One record in the append-only chat log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub user: String,
    pub role: ChatRole,
    pub content: String,
    pub context: ChatContext,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub project_id: Option<String>,
    pub user_id: Option<String>,
}

impl ChatMessage {
    pub fn from_user(user: &str, content: &str, context: &ChatContext) -> Self {
        Self::record(user, ChatRole::User, content, context)
    }

    pub fn from_ai(user: &str, content: &str, context: &ChatContext) -> Self {
        Self::record(user, ChatRole::Ai, content, context)
    }

    fn record(user: &str, role: ChatRole, content: &str, context: &ChatContext) -> Self {
        Self {
            user: user.to_string(),
            role,
            content: content.to_string(),
            context: context.clone(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task>;
    async fn find_by_project(&self, project_id: &str) -> Result<Vec<Task>>;
    async fn update_status(&self, id: &str, status: TaskStatus) -> Result<Task>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>>;
    async fn update_progress(
        &self,
        id: &str,
        progress: i32,
        metadata: ProjectMetadata,
    ) -> Result<Project>;
}

/// Append-only chat log. Fire-and-forget from the core's point of view; no
/// read-back is required by any pipeline.
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    async fn append(&self, message: ChatMessage) -> Result<()>;
}

/// Best-effort cache invalidation. Callers log failures and move on; an
/// invalidation error must never fail the operation that triggered it.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, key_pattern: &str) -> Result<()>;
}
