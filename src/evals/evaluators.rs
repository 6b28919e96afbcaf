//! Scoring functions applied to each evaluated answer.

use crate::agent::{Agent, BotResponse, ChatBackend, NoTools, StructuredOutput};
use crate::config::{JudgePrompts, Prompts};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// How an answer is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Evaluator {
    /// Full marks when the model is at least `min_confidence` percent sure,
    /// otherwise the confidence as a fraction.
    Confidence {
        #[serde(default = "default_min_confidence")]
        min_confidence: i64,
    },
    /// Fraction of the case's expected keywords found in the answer.
    KeywordPresence,
    /// Ask a model to grade the answer against a rubric.
    LlmJudge {
        rubric: String,
        #[serde(default)]
        include_input: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
}

fn default_min_confidence() -> i64 {
    70
}

/// Outcome of one evaluator on one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub evaluator: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EvaluationResult {
    fn scored(evaluator: &str, score: f64) -> Self {
        Self {
            evaluator: evaluator.to_string(),
            score,
            passed: None,
            reason: None,
        }
    }
}

impl Evaluator {
    pub fn name(&self) -> &'static str {
        match self {
            Evaluator::Confidence { .. } => "Confidence",
            Evaluator::KeywordPresence => "KeywordPresence",
            Evaluator::LlmJudge { .. } => "LlmJudge",
        }
    }

    /// Score `output` for a case asking `question`.
    pub async fn evaluate(
        &self,
        question: &str,
        expected_keywords: &[String],
        output: &BotResponse,
        grader: &dyn Grader,
    ) -> Result<EvaluationResult> {
        match self {
            Evaluator::Confidence { min_confidence } => Ok(EvaluationResult::scored(
                self.name(),
                confidence_score(output.confidence_percentage, *min_confidence),
            )),
            Evaluator::KeywordPresence => Ok(EvaluationResult::scored(
                self.name(),
                keyword_score(&output.answer, expected_keywords),
            )),
            Evaluator::LlmJudge {
                rubric,
                include_input,
                model,
            } => {
                let input = include_input.then_some(question);
                let answer = serde_json::to_string_pretty(output)?;
                let verdict = grader.grade(rubric, input, &answer, model.as_deref()).await?;
                Ok(EvaluationResult {
                    evaluator: self.name().to_string(),
                    score: verdict.score,
                    passed: Some(verdict.pass),
                    reason: Some(verdict.reason),
                })
            }
        }
    }
}

pub fn confidence_score(confidence: i64, min_confidence: i64) -> f64 {
    if confidence >= min_confidence {
        1.0
    } else {
        confidence as f64 / 100.0
    }
}

pub fn keyword_score(answer: &str, expected_keywords: &[String]) -> f64 {
    if expected_keywords.is_empty() {
        return 1.0;
    }

    let answer = answer.to_lowercase();
    let found = expected_keywords
        .iter()
        .filter(|k| answer.contains(&k.to_lowercase()))
        .count();

    found as f64 / expected_keywords.len() as f64
}

/// A judge's verdict on an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub reason: String,
    pub pass: bool,
    pub score: f64,
}

impl StructuredOutput for JudgeVerdict {
    const NAME: &'static str = "judge_verdict";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": {"type": "string"},
                "pass": {"type": "boolean"},
                "score": {"type": "number"}
            },
            "required": ["reason", "pass", "score"],
            "additionalProperties": false
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if (0.0..=1.0).contains(&self.score) {
            Ok(())
        } else {
            Err(format!("score must be between 0.0 and 1.0, got {}", self.score))
        }
    }
}

/// Grades an answer against a rubric.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(
        &self,
        rubric: &str,
        input: Option<&str>,
        output: &str,
        model: Option<&str>,
    ) -> Result<JudgeVerdict>;
}

/// Grader that asks an OpenAI model.
pub struct ModelGrader {
    backend: Arc<dyn ChatBackend>,
    default_model: String,
    prompts: JudgePrompts,
}

impl ModelGrader {
    pub fn new(backend: Arc<dyn ChatBackend>, default_model: &str, prompts: JudgePrompts) -> Self {
        Self {
            backend,
            default_model: default_model.to_string(),
            prompts,
        }
    }
}

#[async_trait]
impl Grader for ModelGrader {
    async fn grade(
        &self,
        rubric: &str,
        input: Option<&str>,
        output: &str,
        model: Option<&str>,
    ) -> Result<JudgeVerdict> {
        let model = model.unwrap_or(&self.default_model);

        let mut vars = HashMap::new();
        vars.insert("rubric".to_string(), rubric.to_string());
        vars.insert(
            "input_section".to_string(),
            input
                .map(|q| format!("Input:\n{}\n\n", q))
                .unwrap_or_default(),
        );
        vars.insert("output".to_string(), output.to_string());
        let prompt = Prompts::render(&self.prompts.user, &vars);

        let agent: Agent<JudgeVerdict> =
            Agent::new(self.backend.clone(), model, &self.prompts.system).with_max_iterations(3);
        let response = agent.run(&NoTools, &prompt).await?;
        Ok(response.output)
    }
}
