//! Configuration settings for Trellis.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub agent: AgentSettings,
    pub tavily: TavilySettings,
    pub mcp: McpSettings,
    pub evals: EvalSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Item database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection string (`sqlite:///./test.db`, `sqlite::memory:`, or `memory`).
    pub url: String,
    /// Upper bound applied to the `limit` query parameter.
    pub max_page_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite:///./test.db".to_string(),
            max_page_size: 1000,
        }
    }
}

/// Docs agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// LLM model for the docs agent.
    pub model: String,
    /// Maximum LLM round trips per question.
    pub max_iterations: usize,
    /// How many times a malformed final answer is sent back for correction.
    pub output_retries: usize,
    /// Timeout for a single OpenAI request.
    pub request_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            max_iterations: 10,
            output_retries: 1,
            request_timeout_secs: 300,
        }
    }
}

/// Tavily web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TavilySettings {
    /// API key (also read from `TAVILY_API_KEY`).
    pub api_key: Option<String>,
    /// Base URL of the Tavily API.
    pub endpoint: String,
    /// Maximum results returned per search.
    pub max_results: u32,
}

impl Default for TavilySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.tavily.com".to_string(),
            max_results: 5,
        }
    }
}

/// Browser agent and MCP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    /// LLM model for the browser agent.
    pub model: String,
    /// Command used to launch the MCP server.
    pub command: String,
    /// Arguments passed to the MCP server command.
    pub args: Vec<String>,
    /// Extra environment variables for the MCP server process.
    pub env: std::collections::HashMap<String, String>,
    /// Timeout for a single JSON-RPC request to the MCP server.
    pub request_timeout_secs: u64,
    /// Maximum LLM round trips per question.
    pub max_iterations: usize,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "@playwright/mcp@latest".to_string()],
            env: std::collections::HashMap::new(),
            request_timeout_secs: 120,
            max_iterations: 25,
        }
    }
}

/// Evaluation run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    /// Model used by LLM judge evaluators that don't name one.
    pub judge_model: String,
    /// Maximum cases evaluated concurrently.
    pub concurrency: usize,
    /// Where `trellis evals --save` writes the dataset by default.
    pub dataset_path: String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            judge_model: "gpt-4o-mini".to_string(),
            concurrency: 2,
            dataset_path: "docs_agent_evals.json".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply `DATABASE_URL` and `TAVILY_API_KEY` overrides.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = url;
        }
        if let Some(key) = lookup("TAVILY_API_KEY").filter(|v| !v.is_empty()) {
            self.tavily.api_key = Some(key);
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TrellisError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trellis")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Copy of the settings with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        settings.tavily.api_key = settings.tavily.api_key.as_deref().map(mask_secret);
        settings
    }
}

/// Keep a short prefix and suffix of a secret so it can be recognised.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let prefix: String = chars[..5].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", prefix, suffix)
}
