//! The two question-answering assistants served by Trellis.

use super::output::{BotResponse, McpBotResponse, StructuredOutput};
use super::runner::{Agent, ChatBackend, OpenAIBackend};
use super::tavily::TavilyClient;
use super::tools::WebSearchTools;
use crate::config::{McpSettings, Prompts, Settings};
use crate::error::{Result, TrellisError};
use crate::mcp::{McpClient, McpTools};
use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Answers a natural-language question.
#[async_trait]
pub trait Assistant: Send + Sync {
    type Output: Send;

    async fn answer(&self, question: &str) -> Result<Self::Output>;
}

/// PydanticAI documentation expert with web search.
pub struct DocsAssistant {
    agent: Agent<BotResponse>,
    tools: WebSearchTools,
}

impl DocsAssistant {
    pub fn new(agent: Agent<BotResponse>, tools: WebSearchTools) -> Self {
        Self { agent, tools }
    }

    /// Build the assistant from settings. Fails without a Tavily API key.
    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Self> {
        let tavily = TavilyClient::from_settings(&settings.tavily)?;
        let backend: Arc<dyn ChatBackend> = Arc::new(OpenAIBackend::new(Duration::from_secs(
            settings.agent.request_timeout_secs,
        ))?);

        let system = prompts.render_with_custom(&prompts.docs.system, &HashMap::new());
        let agent = Agent::new(backend, &settings.agent.model, &system)
            .with_max_iterations(settings.agent.max_iterations)
            .with_output_retries(settings.agent.output_retries);

        Ok(Self::new(agent, WebSearchTools::new(tavily)))
    }
}

#[async_trait]
impl Assistant for DocsAssistant {
    type Output = BotResponse;

    #[instrument(skip(self))]
    async fn answer(&self, question: &str) -> Result<BotResponse> {
        let response = self.agent.run(&self.tools, question).await?;
        info!(
            "Docs agent answered in {} iterations with {} tool calls",
            response.iterations,
            response.tool_calls.len()
        );
        Ok(response.output)
    }
}

/// Browser automation assistant backed by an MCP server.
pub struct BrowserAssistant {
    agent: Agent<McpBotResponse>,
    mcp: McpSettings,
}

impl BrowserAssistant {
    pub fn new(agent: Agent<McpBotResponse>, mcp: McpSettings) -> Self {
        Self { agent, mcp }
    }

    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Self> {
        let backend: Arc<dyn ChatBackend> = Arc::new(OpenAIBackend::new(Duration::from_secs(
            settings.agent.request_timeout_secs,
        ))?);

        let system = prompts.render_with_custom(&prompts.browser.system, &HashMap::new());
        let agent = Agent::new(backend, &settings.mcp.model, &system)
            .with_max_iterations(settings.mcp.max_iterations)
            .with_output_retries(settings.agent.output_retries);

        Ok(Self::new(agent, settings.mcp.clone()))
    }

    async fn run_with(&self, client: &McpClient, question: &str) -> Result<McpBotResponse> {
        let tools = McpTools::discover(client).await?;
        info!("Browser agent has {} MCP tools", tools.names().len());

        let response = self.agent.run(&tools, question).await?;
        info!(
            "Browser agent answered in {} iterations with {} tool calls",
            response.iterations,
            response.tool_calls.len()
        );
        Ok(response.output)
    }
}

#[async_trait]
impl Assistant for BrowserAssistant {
    type Output = McpBotResponse;

    #[instrument(skip(self))]
    async fn answer(&self, question: &str) -> Result<McpBotResponse> {
        let session = Uuid::new_v4();
        info!(%session, "Starting MCP session");

        let mut client = McpClient::spawn(&self.mcp)?;
        let result = match client.initialize().await {
            Ok(_) => self.run_with(&client, question).await,
            Err(e) => Err(e),
        };

        if let Err(e) = client.shutdown().await {
            warn!(%session, "Failed to shut down MCP server: {}", e);
        }
        result
    }
}

/// Stand-in for an assistant whose configuration is incomplete.
///
/// Every question fails with the configuration error captured at startup.
pub struct UnavailableAssistant<O> {
    reason: String,
    _output: PhantomData<fn() -> O>,
}

impl<O> UnavailableAssistant<O> {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            _output: PhantomData,
        }
    }
}

#[async_trait]
impl<O: StructuredOutput> Assistant for UnavailableAssistant<O> {
    type Output = O;

    async fn answer(&self, _question: &str) -> Result<O> {
        Err(TrellisError::Config(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::runner::tests::{answer, tool_turn, ScriptedBackend};
    use crate::config::TavilySettings;

    #[test]
    fn test_docs_assistant_requires_tavily_key() {
        let settings = Settings {
            tavily: TavilySettings::default(),
            ..Default::default()
        };
        let err = DocsAssistant::from_settings(&settings, &Prompts::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[tokio::test]
    async fn test_docs_assistant_answers() {
        let backend = Arc::new(ScriptedBackend::new(vec![answer(
            r#"{"answer": "Pass tools=[...] to Agent", "reasoning": "docs", "reference": null, "confidence_percentage": 70}"#,
        )]));
        let agent = Agent::new(backend, "gpt-4.1", "system");
        let tavily = TavilyClient::new("tvly-test", "http://127.0.0.1:9", 5).unwrap();
        let assistant = DocsAssistant::new(agent, WebSearchTools::new(tavily));

        let output = assistant.answer("How do I add tools?").await.unwrap();
        assert_eq!(output.confidence_percentage, 70);
    }

    #[tokio::test]
    async fn test_docs_assistant_survives_search_failure() {
        // Tavily endpoint is unreachable; the error is fed back to the model.
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_turn("tavily_search", r#"{"query": "pydantic ai"}"#),
            answer(r#"{"answer": "a", "reasoning": "search failed", "reference": null, "confidence_percentage": 20}"#),
        ]));
        let agent = Agent::new(backend, "gpt-4.1", "system");
        let tavily = TavilyClient::new("tvly-test", "http://127.0.0.1:9", 5).unwrap();
        let assistant = DocsAssistant::new(agent, WebSearchTools::new(tavily));

        let output = assistant.answer("question").await.unwrap();
        assert_eq!(output.reasoning, "search failed");
    }

    #[tokio::test]
    async fn test_browser_assistant_missing_command() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let agent = Agent::new(backend, "gpt-4o", "system");
        let mcp = McpSettings {
            command: "definitely-not-a-real-mcp-server".to_string(),
            ..Default::default()
        };
        let assistant = BrowserAssistant::new(agent, mcp);

        let err = assistant.answer("Open pydantic.dev").await.unwrap_err();
        assert!(matches!(err, TrellisError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_browser_assistant_closes_server_when_initialize_fails() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("closed");

        // Rejects initialize, then exits cleanly once its stdin is closed.
        let script = r#"read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"boom"}}'
cat > /dev/null
touch "$TRELLIS_MARKER""#;
        let mcp = McpSettings {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: HashMap::from([(
                "TRELLIS_MARKER".to_string(),
                marker.to_string_lossy().to_string(),
            )]),
            request_timeout_secs: 5,
            ..Default::default()
        };
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let assistant = BrowserAssistant::new(Agent::new(backend, "gpt-4o", "system"), mcp);

        let err = assistant.answer("Open pydantic.dev").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn test_unavailable_assistant() {
        let assistant: UnavailableAssistant<BotResponse> =
            UnavailableAssistant::new("TAVILY_API_KEY not set");
        let err = assistant.answer("anything").await.unwrap_err();
        assert!(matches!(err, TrellisError::Config(_)));
    }
}
