use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use zenai::capability::demo::{DemoProvider, DemoTranscriber};
use zenai::pipeline::MeetingContext;
use zenai::store::memory::{
    InMemoryChatHistory, InMemoryProjectStore, InMemoryTaskStore, RecordingCache,
};
use zenai::store::{ChatContext, Priority, Project, ProjectMetadata};
use zenai::{AiConfig, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_level(true)
        .init();

    let config = AiConfig::from_env();
    info!(model = %config.model, "starting ZenAI demo host");

    // Demo wiring: offline providers and in-memory stores, seeded with one
    // project so every pipeline has something to work against.
    let projects = Arc::new(InMemoryProjectStore::new());
    projects
        .insert(Project {
            id: "demo".to_string(),
            name: "Demo Project".to_string(),
            description: "A sample project for trying out ZenAI".to_string(),
            status: "active".to_string(),
            priority: Priority::Medium,
            progress: 0,
            metadata: ProjectMetadata::default(),
        })
        .await;

    let orchestrator = Orchestrator::new(
        Arc::new(DemoProvider::new()),
        Arc::new(DemoTranscriber::new()),
        Arc::new(InMemoryTaskStore::new()),
        projects,
        Arc::new(InMemoryChatHistory::new()),
        Arc::new(RecordingCache::new()),
    );
    orchestrator.initialize().await?;

    println!("ZenAI demo. Type a message, or `meeting` / `suggest` / `quit`.");

    let context = ChatContext {
        project_id: Some("demo".to_string()),
        user_id: Some("demo-user".to_string()),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "meeting" => {
                let meeting_context = MeetingContext {
                    project_id: "demo".to_string(),
                    user_id: context.user_id.clone(),
                    title: Some("Weekly Sync".to_string()),
                    language: None,
                };
                match orchestrator
                    .transcribe_meeting("demo-recording.mp3", &meeting_context)
                    .await
                {
                    Ok(outcome) => println!("zenai> {}", outcome.message),
                    Err(err) => println!("zenai> ❌ {}", err),
                }
            }
            "suggest" => match orchestrator.generate_task_suggestions("demo").await {
                Ok(outcome) => {
                    println!("zenai> {}", outcome.message);
                    for suggestion in &outcome.suggestions {
                        println!("  - {}", suggestion.title);
                    }
                }
                Err(err) => println!("zenai> ❌ {}", err),
            },
            message => match orchestrator.chat("demo-user", message, &context).await {
                Ok(response) => println!("zenai> {}", response.message()),
                Err(err) => println!("zenai> ❌ {}", err),
            },
        }
    }

    Ok(())
}
