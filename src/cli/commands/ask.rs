//! Ask command implementation.

use crate::agent::{Assistant, DocsAssistant};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'trellis doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.agent.model = model;
    }

    let prompts = Prompts::from_settings(&settings)?;
    let assistant = DocsAssistant::from_settings(&settings, &prompts)?;

    let spinner = Output::spinner("Consulting the PydanticAI docs...");

    match assistant.answer(question).await {
        Ok(response) => {
            spinner.finish_and_clear();
            Output::bot_response(&response);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
