//! MCP (Model Context Protocol) client.
//!
//! Launches an MCP server (Playwright by default) as a child process and
//! speaks JSON-RPC 2.0 with it over stdio, so the browser agent can use
//! the server's tools.

mod client;
mod protocol;
mod tools;

pub use client::McpClient;
pub use protocol::{InitializeResult, ServerInfo, Tool, ToolCallResult, ToolContent};
pub use tools::McpTools;
