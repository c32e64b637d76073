//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::extraction::ProviderId;

/// Main configuration for tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Rule engine configuration.
    pub extraction: ExtractionConfig,

    /// Remote backend configuration.
    pub remote: RemoteConfig,
}

/// Rule engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Provider used when a call does not name one.
    pub default_provider: ProviderId,

    /// Days until payment when the text gives no due date.
    pub default_due_days: u32,

    /// Collapse duplicate line items produced by overlapping patterns.
    pub dedupe_line_items: bool,

    /// Keywords that switch line item extraction into recurring-delivery mode.
    pub recurring_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderId::Remote,
            default_due_days: 30,
            dedupe_line_items: false,
            recurring_keywords: vec![
                "newspaper".to_string(),
                "newspapers".to_string(),
                "paper delivery".to_string(),
                "paper round".to_string(),
            ],
        }
    }
}

/// Remote completion backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Transport timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "TALLY_API_KEY".to_string(),
            timeout_secs: 30,
            temperature: 0.1,
        }
    }
}

impl TallyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
