//! Browse command implementation.

use crate::agent::{Assistant, BrowserAssistant};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use anyhow::Result;

/// Run the browse command.
pub async fn run_browse(question: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Browse, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'trellis doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.mcp.model = model;
    }

    let prompts = Prompts::from_settings(&settings)?;
    let assistant = BrowserAssistant::from_settings(&settings, &prompts)?;

    Output::info(&format!(
        "Starting MCP server: {} {}",
        settings.mcp.command,
        settings.mcp.args.join(" ")
    ));
    let spinner = Output::spinner("Browsing...");

    match assistant.answer(question).await {
        Ok(response) => {
            spinner.finish_and_clear();
            Output::mcp_response(&response);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Browser agent failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
