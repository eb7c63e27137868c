use serde::{Deserialize, Serialize};

/// Runtime configuration for the AI backends. Everything has a sensible
/// default so the demo host runs with no environment set up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub whisper: WhisperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    pub model: String,
    pub language: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            whisper: WhisperConfig {
                model: "whisper-1".to_string(),
                language: "en".to_string(),
            },
        }
    }
}

impl AiConfig {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: std::env::var("AI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: std::env::var("AI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            whisper: WhisperConfig {
                model: std::env::var("WHISPER_MODEL").unwrap_or(defaults.whisper.model),
                language: std::env::var("WHISPER_LANGUAGE").unwrap_or(defaults.whisper.language),
            },
        }
    }
}
