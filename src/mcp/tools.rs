//! Expose MCP server tools to the agent.

use super::client::McpClient;
use super::protocol::Tool;
use crate::agent::ToolProvider;
use crate::error::{Result, TrellisError};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

/// Tool results longer than this are cut before going back to the model.
const MAX_TOOL_OUTPUT_CHARS: usize = 20_000;

/// Tools discovered from an MCP server.
pub struct McpTools<'a> {
    client: &'a McpClient,
    tools: Vec<Tool>,
}

impl<'a> McpTools<'a> {
    /// Discover the tools offered by `client`.
    pub async fn discover(client: &'a McpClient) -> Result<Self> {
        let tools = client.list_tools().await?;
        Ok(Self { client, tools })
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

#[async_trait]
impl ToolProvider for McpTools<'_> {
    fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools.iter().map(to_openai_tool).collect()
    }

    async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(TrellisError::Tool(format!("Unknown tool: {}", name)));
        }

        let arguments: Value = if arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(arguments)
                .map_err(|e| TrellisError::Tool(format!("Invalid tool arguments: {}", e)))?
        };

        let result = self.client.call_tool(name, arguments).await?;
        let text = truncate(&result.to_text(), MAX_TOOL_OUTPUT_CHARS);

        if result.is_error {
            warn!("MCP tool {} reported an error", name);
            return Err(TrellisError::Tool(text));
        }
        Ok(text)
    }
}

fn to_openai_tool(tool: &Tool) -> ChatCompletionTool {
    let mut parameters = match &tool.input_schema {
        Value::Object(_) => tool.input_schema.clone(),
        _ => json!({ "type": "object" }),
    };
    if let Some(obj) = parameters.as_object_mut() {
        obj.entry("properties").or_insert_with(|| json!({}));
    }

    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

/// Cut `s` to at most `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}\n... [truncated]", &s[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::tests::connected_client;

    #[test]
    fn test_schema_gets_properties() {
        let tool = Tool {
            name: "browser_close".to_string(),
            description: None,
            input_schema: json!({"type": "object"}),
        };
        let def = to_openai_tool(&tool);
        assert_eq!(def.function.parameters.unwrap()["properties"], json!({}));

        let tool = Tool {
            name: "odd".to_string(),
            description: Some("no schema".to_string()),
            input_schema: Value::Null,
        };
        let params = to_openai_tool(&tool).function.parameters.unwrap();
        assert_eq!(params["type"], "object");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé\n... [truncated]");
    }

    #[tokio::test]
    async fn test_discover_and_call() {
        let mut client = connected_client();
        client.initialize().await.unwrap();

        let tools = McpTools::discover(&client).await.unwrap();
        assert_eq!(tools.names(), vec!["browser_navigate", "browser_snapshot"]);
        assert_eq!(tools.definitions().len(), 2);

        let output = tools
            .call("browser_navigate", r#"{"url": "https://ai.pydantic.dev"}"#)
            .await
            .unwrap();
        assert_eq!(output, "Navigated to https://ai.pydantic.dev");

        assert!(tools.call("browser_teleport", "{}").await.is_err());
        assert!(tools.call("browser_navigate", "{not json").await.is_err());
    }
}
