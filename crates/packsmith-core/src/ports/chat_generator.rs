//! Text generation port.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GenerationError;

/// Sampling preset for a chat request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTask {
    #[default]
    Default,
    Extraction,
    Creative,
    Analysis,
}

impl ChatTask {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Extraction => "extraction",
            Self::Creative => "creative",
            Self::Analysis => "analysis",
        }
    }

    /// Sampling temperature for the preset.
    pub const fn temperature(self) -> f32 {
        match self {
            Self::Default => 0.7,
            Self::Extraction => 0.1,
            Self::Creative => 1.0,
            Self::Analysis => 0.3,
        }
    }
}

impl fmt::Display for ChatTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "extraction" => Ok(Self::Extraction),
            "creative" => Ok(Self::Creative),
            "analysis" => Ok(Self::Analysis),
            other => Err(format!(
                "Unknown task type '{other}'. Expected default, extraction, creative or analysis"
            )),
        }
    }
}

/// One chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub prompt: String,
    pub task: ChatTask,
    /// JSON schema the answer must follow.
    pub response_schema: Option<Value>,
}

/// Generates text or structured JSON.
#[async_trait]
pub trait ChatGenerator: Send + Sync {
    /// With a schema the parsed JSON answer is returned, otherwise
    /// `{"text": "..."}`.
    async fn generate(&self, request: &ChatRequest) -> Result<Value, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_parse_and_order_by_temperature() {
        let extraction: ChatTask = "extraction".parse().unwrap();
        assert!(extraction.temperature() < ChatTask::Analysis.temperature());
        assert!(ChatTask::Analysis.temperature() < ChatTask::Default.temperature());
        assert!(ChatTask::Default.temperature() < ChatTask::Creative.temperature());
        assert!("poetry".parse::<ChatTask>().is_err());
    }
}
