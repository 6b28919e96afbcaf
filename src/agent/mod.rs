//! Agent system for answering questions with tool calling.
//!
//! Provides an LLM agent loop that can call tools (Tavily web search or the
//! tools of an MCP server) and must finish with a structured JSON answer.

mod assistants;
mod output;
mod runner;
mod tavily;
mod tools;

pub use assistants::{Assistant, BrowserAssistant, DocsAssistant, UnavailableAssistant};
pub use output::{parse_output, BotResponse, McpBotResponse, StructuredOutput};
pub use runner::{Agent, AgentResponse, ChatBackend, ModelTurn, OpenAIBackend, ToolCallRecord};
pub use tavily::{SearchDepth, SearchQuery, SearchResult, SearchTopic, TavilyClient, TimeRange};
#[cfg(test)]
pub(crate) use runner::tests as runner_test_support;
pub use tools::{parse_tool_call, tool_definitions, NoTools, ToolCall, ToolProvider, WebSearchTools};
