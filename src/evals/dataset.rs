//! Evaluation cases and the built-in docs agent dataset.

use super::evaluators::{EvaluationResult, Evaluator, Grader};
use super::report::{CaseReport, Report};
use crate::agent::{Assistant, BotResponse};
use crate::error::Result;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Descriptive metadata attached to a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// easy, medium or hard.
    pub difficulty: String,
    pub topic: String,
    #[serde(default)]
    pub expected_keywords: Vec<String>,
}

/// A single question with its own evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub name: String,
    pub question: String,
    pub metadata: CaseMetadata,
    #[serde(default)]
    pub evaluators: Vec<Evaluator>,
}

/// Cases plus evaluators applied to every case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub cases: Vec<Case>,
    #[serde(default)]
    pub evaluators: Vec<Evaluator>,
}

impl Dataset {
    /// Questions about the PydanticAI framework for the docs agent.
    pub fn builtin() -> Self {
        Self {
            cases: vec![
                builtin_case(
                    "basic_agent_creation",
                    "How do I create a basic PydanticAI agent?",
                    "easy",
                    "agent_creation",
                    &["Agent", "model", "system_prompt", "pydantic_ai"],
                    80,
                    "Response should clearly explain how to create a PydanticAI agent with code examples",
                ),
                builtin_case(
                    "user_prompt_modification",
                    "How do I change the user prompt in PydanticAI?",
                    "medium",
                    "prompt_handling",
                    &["run", "run_sync", "user_prompt", "agent"],
                    75,
                    "Response should explain how to modify user prompts with practical examples",
                ),
                builtin_case(
                    "tools_integration",
                    "How do I add tools to a PydanticAI agent?",
                    "medium",
                    "tools",
                    &["tools", "function", "decorator", "@tool"],
                    70,
                    "Response should explain tools integration with clear examples and best practices",
                ),
            ],
            evaluators: vec![Evaluator::LlmJudge {
                rubric: "Response should be helpful, accurate, and well-structured for PydanticAI documentation questions".to_string(),
                include_input: false,
                model: Some("gpt-4o-mini".to_string()),
            }],
        }
    }

    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the dataset as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Run every case through `task` and score the answers.
    ///
    /// At most `concurrency` cases run at once. Case order is preserved in
    /// the report.
    pub async fn evaluate(
        &self,
        task: &dyn Assistant<Output = BotResponse>,
        grader: &dyn Grader,
        concurrency: usize,
    ) -> Report {
        let run_id = uuid::Uuid::new_v4();
        let started_at = chrono::Utc::now();
        let started = Instant::now();
        info!("Starting evaluation run {} with {} cases", run_id, self.cases.len());

        let mut cases: Vec<(usize, CaseReport)> = stream::iter(self.cases.iter().enumerate())
            .map(|(index, case)| async move {
                (index, self.evaluate_case(case, task, grader).await)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        cases.sort_by_key(|(index, _)| *index);

        Report {
            run_id,
            started_at,
            cases: cases.into_iter().map(|(_, report)| report).collect(),
            total_duration: started.elapsed(),
        }
    }

    async fn evaluate_case(
        &self,
        case: &Case,
        task: &dyn Assistant<Output = BotResponse>,
        grader: &dyn Grader,
    ) -> CaseReport {
        info!("Evaluating case {}", case.name);
        let started = Instant::now();
        let output = task.answer(&case.question).await;
        let task_duration = started.elapsed();

        let mut report = CaseReport {
            name: case.name.clone(),
            question: case.question.clone(),
            output: None,
            error: None,
            task_duration,
            scores: Vec::new(),
            evaluator_failures: Vec::new(),
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!("Case {} failed: {}", case.name, e);
                report.error = Some(e.to_string());
                return report;
            }
        };

        for evaluator in case.evaluators.iter().chain(&self.evaluators) {
            match evaluator
                .evaluate(
                    &case.question,
                    &case.metadata.expected_keywords,
                    &output,
                    grader,
                )
                .await
            {
                Ok(result) => report.scores.push(result),
                Err(e) => {
                    warn!("{} failed on {}: {}", evaluator.name(), case.name, e);
                    report
                        .evaluator_failures
                        .push(format!("{}: {}", evaluator.name(), e));
                }
            }
        }

        report.output = Some(output);
        report
    }
}

fn builtin_case(
    name: &str,
    question: &str,
    difficulty: &str,
    topic: &str,
    keywords: &[&str],
    min_confidence: i64,
    rubric: &str,
) -> Case {
    Case {
        name: name.to_string(),
        question: question.to_string(),
        metadata: CaseMetadata {
            difficulty: difficulty.to_string(),
            topic: topic.to_string(),
            expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        },
        evaluators: vec![
            Evaluator::Confidence { min_confidence },
            Evaluator::KeywordPresence,
            Evaluator::LlmJudge {
                rubric: rubric.to_string(),
                include_input: true,
                model: None,
            },
        ],
    }
}

/// Average score per evaluator name, in first-seen order.
pub(crate) fn averages(scores: &[&EvaluationResult]) -> Vec<(String, f64)> {
    let mut sums: Vec<(String, f64, usize)> = Vec::new();
    for result in scores {
        match sums.iter_mut().find(|(name, _, _)| *name == result.evaluator) {
            Some(entry) => {
                entry.1 += result.score;
                entry.2 += 1;
            }
            None => sums.push((result.evaluator.clone(), result.score, 1)),
        }
    }
    sums.into_iter()
        .map(|(name, sum, count)| (name, sum / count as f64))
        .collect()
}
