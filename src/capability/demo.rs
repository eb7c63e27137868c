use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{
    Capability, CapabilityProvider, CapabilityRequest, ProviderError, Transcript,
    TranscriptSegment, TranscriptionProvider,
};

/// Built-in provider that answers every capability deterministically from
/// the request input, so the demo host runs without API keys or network
/// access. Real deployments swap in an LLM-backed provider.
pub struct DemoProvider;

impl DemoProvider {
    pub fn new() -> Self {
        Self
    }

    fn extract_task(&self, input: &Value) -> Value {
        let description = input["description"].as_str().unwrap_or("").trim();
        let lower = description.to_lowercase();

        let priority = if lower.contains("urgent") || lower.contains("asap") {
            "urgent"
        } else if lower.contains("important") || lower.contains("critical") {
            "high"
        } else if lower.contains("minor") || lower.contains("later") {
            "low"
        } else {
            "medium"
        };

        let mut tags = Vec::new();
        for keyword in ["bug", "docs", "design", "meeting", "release"] {
            if lower.contains(keyword) {
                tags.push(keyword);
            }
        }

        // Title: first clause, capitalized.
        let clause = description
            .split(['.', ',', '\n'])
            .next()
            .unwrap_or(description)
            .trim();
        let mut title: String = clause.chars().take(80).collect();
        if let Some(first) = title.get(0..1) {
            let upper = first.to_uppercase();
            title.replace_range(0..1, &upper);
        }

        json!({
            "title": title,
            "description": description,
            "priority": priority,
            "estimatedTime": 2,
            "tags": tags,
        })
    }

    fn analyze_task(&self, input: &Value) -> Value {
        let description = input["task"]["description"].as_str().unwrap_or("");
        let complexity = match description.len() {
            0..=40 => 3,
            41..=120 => 5,
            _ => 7,
        };
        json!({
            "complexityScore": complexity,
            "estimatedHours": complexity as f64,
            "skillsRequired": ["general engineering"],
            "dependencies": [],
            "risks": ["estimate is a demo heuristic"],
            "recommendations": ["refine scope before starting"],
        })
    }

    fn project_health(&self, input: &Value) -> Value {
        let total = input["taskCounts"]["total"].as_u64().unwrap_or(0);
        let completed = input["taskCounts"]["completed"].as_u64().unwrap_or(0);
        let ratio = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        };
        let score = (40.0 + ratio * 60.0).round() as i64;
        let status = if score >= 70 {
            "healthy"
        } else if score >= 40 {
            "at-risk"
        } else {
            "critical"
        };
        json!({
            "healthScore": score,
            "status": status,
            "insights": [
                format!("{} of {} tasks are done", completed, total),
                "demo provider scores completion ratio only",
            ],
            "risks": ["no real model behind this assessment"],
            "recommendations": ["connect an LLM provider for real insights"],
        })
    }

    fn break_down(&self, input: &Value) -> Value {
        let title = input["title"].as_str().unwrap_or("the project");
        json!([
            {
                "title": format!("Define scope for {}", title),
                "description": "Agree on what is in and out of the next milestone",
                "estimatedTime": 3,
                "priority": "high",
            },
            {
                "title": "Set up progress tracking",
                "description": "Create the initial task board and owners",
                "estimatedTime": 2,
                "priority": "medium",
            },
            {
                "title": "Schedule a kickoff review",
                "description": "Walk the plan with the team and collect risks",
                "estimatedTime": 1,
                "priority": "low",
            },
        ])
    }

    fn summarize(&self, input: &Value) -> Value {
        let title = input["title"].as_str().unwrap_or("Team Meeting");
        json!({
            "executiveSummary": format!("{} covered progress, blockers, and next steps.", title),
            "keyPoints": ["progress reviewed", "blockers raised"],
            "decisions": ["follow up on the listed action items"],
            "nextSteps": ["create tasks for each action item"],
        })
    }

    fn extract_action_items(&self, input: &Value) -> Value {
        let transcript = input["transcript"].as_str().unwrap_or("");
        let items: Vec<Value> = transcript
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim_start();
                let prefix = trimmed.get(..7)?;
                if !prefix.eq_ignore_ascii_case("action:") {
                    return None;
                }
                let action = trimmed[7..].trim();
                if action.is_empty() {
                    return None;
                }
                Some(json!({"action": action, "priority": "medium"}))
            })
            .collect();
        json!(items)
    }

    fn chat(&self, input: &Value) -> Value {
        let message = input["message"].as_str().unwrap_or("");
        json!({
            "content": format!(
                "I'm running in demo mode with limited capabilities. Your message: \"{}\"\n\n\
                 Try \"create a task to ...\" or \"analyze status\" to exercise the pipelines. \
                 For real answers, connect an LLM-backed provider.",
                message
            )
        })
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for DemoProvider {
    fn name(&self) -> &str {
        "demo"
    }

    async fn invoke(&self, request: CapabilityRequest) -> Result<Value, ProviderError> {
        let input = &request.input;
        let output = match request.capability {
            Capability::TaskExtraction => self.extract_task(input),
            Capability::TaskAnalysis => self.analyze_task(input),
            Capability::ProjectHealth => self.project_health(input),
            Capability::TaskBreakdown => self.break_down(input),
            Capability::Summarization => self.summarize(input),
            Capability::ActionItemExtraction => self.extract_action_items(input),
            Capability::Chat => self.chat(input),
            // Audio goes through the transcription provider, not here.
            Capability::Transcription => return Err(ProviderError::Unsupported(request.capability)),
        };
        Ok(output)
    }

    async fn warm_up(&self) -> Result<(), ProviderError> {
        info!("demo provider warmed up");
        Ok(())
    }
}

/// Offline transcription stub: returns a canned standup transcript whose
/// "Action:" lines the demo provider can lift into action items.
pub struct DemoTranscriber;

impl DemoTranscriber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DemoTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionProvider for DemoTranscriber {
    async fn transcribe(
        &self,
        audio_ref: &str,
        language: Option<&str>,
    ) -> Result<Transcript, ProviderError> {
        info!(%audio_ref, "demo transcriber returning canned transcript");
        let text = "Weekly sync. QA is blocked on the login flow.\n\
                    Action: fix the login bug, urgent\n\
                    Action: update the release notes"
            .to_string();
        Ok(Transcript {
            segments: vec![TranscriptSegment {
                start: 0.0,
                end: 42.0,
                text: text.clone(),
            }],
            text,
            duration: 42.0,
            language: language.unwrap_or("en").to_string(),
        })
    }
}
