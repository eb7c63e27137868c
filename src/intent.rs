use std::fmt;

/// Classified purpose of a user utterance. Drives handler routing; routing
/// is total because `GeneralQuery` is the fallback arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CreateTask,
    AnalyzeProject,
    GeneralQuery,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::CreateTask => "create_task",
            Intent::AnalyzeProject => "analyze_project",
            Intent::GeneralQuery => "general_query",
        };
        f.write_str(name)
    }
}

/// Map a raw message to an intent. Pure, case-insensitive substring rules in
/// fixed priority order; cheap enough to run on every inbound chat message.
pub fn classify(message: &str) -> Intent {
    let lower = message.to_lowercase();

    if (lower.contains("create") || lower.contains("add"))
        && (lower.contains("task") || lower.contains("todo"))
    {
        return Intent::CreateTask;
    }

    if lower.contains("analyze")
        || lower.contains("summary")
        || lower.contains("status")
        || lower.contains("health")
    {
        return Intent::AnalyzeProject;
    }

    Intent::GeneralQuery
}
