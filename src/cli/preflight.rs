//! Pre-flight checks before agent operations.
//!
//! Validates that API keys and the MCP server command are available before
//! starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TrellisError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The docs agent needs OpenAI and Tavily.
    Ask,
    /// The browser agent needs OpenAI and the MCP server command.
    Browse,
    /// Evaluations run the docs agent and an OpenAI judge.
    Evals,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_api_key()?;
    match operation {
        Operation::Ask | Operation::Evals => check_tavily_key(settings),
        Operation::Browse => check_tool(&settings.mcp.command),
    }
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TrellisError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(TrellisError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn check_tavily_key(settings: &Settings) -> Result<()> {
    match settings.tavily.api_key.as_deref() {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(TrellisError::Config(
            "TAVILY_API_KEY not set. Set it with: export TAVILY_API_KEY='tvly-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TrellisError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TrellisError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TrellisError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tavily_key() {
        let settings = Settings::default();
        let err = check_tavily_key(&settings).unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("definitely-not-a-real-mcp-server").unwrap_err();
        assert!(matches!(err, TrellisError::ToolNotFound(_)));
    }
}
