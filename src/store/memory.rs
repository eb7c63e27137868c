use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
    CacheInvalidator, ChatHistoryStore, ChatMessage, Project, ProjectMetadata, ProjectStore, Task,
    TaskStatus, TaskStore,
};
use crate::error::{OrchestratorError, Result};

/// In-memory task store backing the demo host and the test suite.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(OrchestratorError::ValidationFailed(
                "task title must not be empty".to_string(),
            ));
        }
        let mut tasks = self.tasks.lock().await;
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn find_by_project(&self, project_id: &str) -> Result<Vec<Task>> {
        let tasks = self.tasks.lock().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| t.project == project_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching)
    }

    async fn update_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::not_found("task", id))?;
        task.status = status;
        Ok(task.clone())
    }
}

#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: Mutex<HashMap<String, Project>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, project: Project) {
        self.projects.lock().await.insert(project.id.clone(), project);
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.projects.lock().await.get(id).cloned())
    }

    async fn update_progress(
        &self,
        id: &str,
        progress: i32,
        metadata: ProjectMetadata,
    ) -> Result<Project> {
        let mut projects = self.projects.lock().await;
        let project = projects
            .get_mut(id)
            .ok_or_else(|| OrchestratorError::not_found("project", id))?;
        project.progress = progress;
        project.metadata = metadata;
        Ok(project.clone())
    }
}

#[derive(Default)]
pub struct InMemoryChatHistory {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent messages for a user, oldest first.
    pub async fn recent(&self, user: &str, limit: usize) -> Vec<ChatMessage> {
        let messages = self.messages.lock().await;
        let mut recent: Vec<ChatMessage> = messages
            .iter()
            .rev()
            .filter(|m| m.user == user)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        recent
    }
}

#[async_trait]
impl ChatHistoryStore for InMemoryChatHistory {
    async fn append(&self, message: ChatMessage) -> Result<()> {
        self.messages.lock().await.push(message);
        Ok(())
    }
}

/// Cache stub that records the invalidated patterns.
#[derive(Default)]
pub struct RecordingCache {
    patterns: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn invalidated(&self) -> Vec<String> {
        self.patterns.lock().await.clone()
    }
}

#[async_trait]
impl CacheInvalidator for RecordingCache {
    async fn invalidate(&self, key_pattern: &str) -> Result<()> {
        self.patterns.lock().await.push(key_pattern.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Priority;

    fn sample_task(id: &str, project: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            project: project.to_string(),
            priority: Priority::Medium,
            estimated_time: 1.0,
            complexity: None,
            tags: vec![],
            assignee: None,
            due_date: None,
            status,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn find_by_project_filters_and_orders() {
        let store = InMemoryTaskStore::new();
        store
            .create(sample_task("b", "proj-1", TaskStatus::Todo))
            .await
            .unwrap();
        store
            .create(sample_task("a", "proj-1", TaskStatus::Done))
            .await
            .unwrap();
        store
            .create(sample_task("c", "proj-2", TaskStatus::Todo))
            .await
            .unwrap();

        let tasks = store.find_by_project("proj-1").await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "a");
    }

    #[tokio::test]
    async fn update_status_on_unknown_task_is_not_found() {
        let store = InMemoryTaskStore::new();
        let err = store.update_status("nope", TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound { kind: "task", .. }));
    }
}
