//! Evals command implementation.

use crate::agent::{ChatBackend, DocsAssistant, OpenAIBackend};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::evals::{Dataset, ModelGrader, PrintOptions};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Run the evals command.
pub async fn run_evals(
    dataset: Option<String>,
    save: Option<String>,
    concurrency: Option<usize>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Evals, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'trellis doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let dataset = match dataset {
        Some(path) => {
            let path = Settings::expand_path(&path);
            Dataset::load(&path)
                .with_context(|| format!("Failed to load dataset from {}", path.display()))?
        }
        None => Dataset::builtin(),
    };
    let concurrency = concurrency.unwrap_or(settings.evals.concurrency);

    let prompts = Prompts::from_settings(&settings)?;
    let assistant = DocsAssistant::from_settings(&settings, &prompts)?;
    let backend: Arc<dyn ChatBackend> = Arc::new(OpenAIBackend::new(Duration::from_secs(
        settings.agent.request_timeout_secs,
    ))?);
    let grader = ModelGrader::new(backend, &settings.evals.judge_model, prompts.judge.clone());

    Output::header("Running PydanticAI Docs Agent Evaluation");
    Output::kv("Cases", &dataset.cases.len().to_string());
    Output::kv("Concurrency", &concurrency.to_string());

    let spinner = Output::spinner("Evaluating...");
    let report = dataset.evaluate(&assistant, &grader, concurrency).await;
    spinner.finish_and_clear();

    report.print(PrintOptions::default());

    if let Some(path) = save {
        let path = if path.is_empty() {
            PathBuf::from(&settings.evals.dataset_path)
        } else {
            Settings::expand_path(&path)
        };
        dataset.save(&path)?;
        Output::success(&format!("Dataset saved to: {}", path.display()));
    }

    if report.failures() > 0 {
        Output::warning(&format!("{} case(s) failed.", report.failures()));
    }

    Ok(())
}
