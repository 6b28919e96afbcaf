//! Tool definitions and implementations for the agent system.

use super::tavily::{SearchDepth, SearchQuery, SearchTopic, TavilyClient, TimeRange};
use crate::error::{Result, TrellisError};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use serde::Deserialize;

/// A source of tools the agent can call.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// OpenAI function definitions for every available tool.
    fn definitions(&self) -> Vec<ChatCompletionTool>;

    /// Execute a tool by name with its JSON arguments and return the text result.
    async fn call(&self, name: &str, arguments: &str) -> Result<String>;
}

/// Provider with no tools at all.
pub struct NoTools;

#[async_trait]
impl ToolProvider for NoTools {
    fn definitions(&self) -> Vec<ChatCompletionTool> {
        Vec::new()
    }

    async fn call(&self, name: &str, _arguments: &str) -> Result<String> {
        Err(TrellisError::Tool(format!("Unknown tool: {}", name)))
    }
}

/// Tools available to the documentation agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Search the web with Tavily.
    TavilySearch {
        query: String,
        search_deep: SearchDepth,
        topic: SearchTopic,
        time_range: Option<TimeRange>,
    },
}

/// Arguments the model sends for `tavily_search`. Null means "use the default".
#[derive(Debug, Deserialize)]
struct TavilySearchArgs {
    query: String,
    #[serde(default)]
    search_deep: Option<SearchDepth>,
    #[serde(default)]
    topic: Option<SearchTopic>,
    #[serde(default)]
    time_range: Option<TimeRange>,
}

/// Web search tools backed by Tavily.
pub struct WebSearchTools {
    tavily: TavilyClient,
}

impl WebSearchTools {
    pub fn new(tavily: TavilyClient) -> Self {
        Self { tavily }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::TavilySearch {
                query,
                search_deep,
                topic,
                time_range,
            } => {
                let query = SearchQuery {
                    query: query.clone(),
                    search_depth: *search_deep,
                    topic: *topic,
                    time_range: *time_range,
                };
                let results = self.tavily.search(&query).await?;
                Ok(serde_json::to_string(&results)?)
            }
        }
    }
}

#[async_trait]
impl ToolProvider for WebSearchTools {
    fn definitions(&self) -> Vec<ChatCompletionTool> {
        tool_definitions()
    }

    async fn call(&self, name: &str, arguments: &str) -> Result<String> {
        let tool = parse_tool_call(name, arguments)?;
        self.execute(&tool).await
    }
}

/// Get OpenAI function/tool definitions for the web search tools.
pub fn tool_definitions() -> Vec<ChatCompletionTool> {
    vec![ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: "tavily_search".to_string(),
            description: Some(
                "Searches Tavily for the given query and returns the results. \
                Use this to look up documentation, guides, and recent information."
                    .to_string(),
            ),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "search_deep": {
                        "type": "string",
                        "enum": ["basic", "advanced"],
                        "description": "The depth of the search (default: basic)",
                        "default": "basic"
                    },
                    "topic": {
                        "type": "string",
                        "enum": ["general", "news"],
                        "description": "The category of the search (default: general)",
                        "default": "general"
                    },
                    "time_range": {
                        "type": "string",
                        "enum": ["day", "week", "month", "year"],
                        "description": "Only return results from this far back (optional)"
                    }
                },
                "required": ["query"]
            })),
            strict: None,
        },
    }]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    match name {
        "tavily_search" => {
            let args: TavilySearchArgs = serde_json::from_str(arguments)
                .map_err(|e| TrellisError::Tool(format!("Invalid tool arguments: {}", e)))?;

            Ok(ToolCall::TavilySearch {
                query: args.query,
                search_deep: args.search_deep.unwrap_or_default(),
                topic: args.topic.unwrap_or_default(),
                time_range: args.time_range,
            })
        }
        _ => Err(TrellisError::Tool(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_tool() {
        let tool = parse_tool_call(
            "tavily_search",
            r#"{"query": "pydantic ai tools", "search_deep": "advanced", "time_range": "month"}"#,
        )
        .unwrap();

        assert_eq!(
            tool,
            ToolCall::TavilySearch {
                query: "pydantic ai tools".to_string(),
                search_deep: SearchDepth::Advanced,
                topic: SearchTopic::General,
                time_range: Some(TimeRange::Month),
            }
        );
    }

    #[test]
    fn test_parse_search_defaults() {
        let tool = parse_tool_call(
            "tavily_search",
            r#"{"query": "agents", "search_deep": null, "time_range": null}"#,
        )
        .unwrap();
        match tool {
            ToolCall::TavilySearch {
                search_deep,
                topic,
                time_range,
                ..
            } => {
                assert_eq!(search_deep, SearchDepth::Basic);
                assert_eq!(topic, SearchTopic::General);
                assert!(time_range.is_none());
            }
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_tool_call("tavily_search", r#"{}"#).is_err());
        assert!(parse_tool_call("tavily_search", "not json").is_err());
        assert!(parse_tool_call("tavily_search", r#"{"query": "q", "topic": "sports"}"#).is_err());
        assert!(parse_tool_call("tavily_search", r#"{"query": 42}"#).is_err());
        assert!(parse_tool_call("delete_everything", r#"{}"#).is_err());

        let err = parse_tool_call("tavily_search", r#"{"topic": "news"}"#).unwrap_err();
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_tool_definitions() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].function.name, "tavily_search");
    }

    #[tokio::test]
    async fn test_no_tools() {
        assert!(NoTools.definitions().is_empty());
        assert!(NoTools.call("anything", "{}").await.is_err());
    }
}
