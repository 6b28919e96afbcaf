//! Evaluation of the docs agent.
//!
//! A dataset of PydanticAI questions is run through an assistant and each
//! answer is scored by confidence, keyword coverage and an LLM judge.

mod dataset;
mod evaluators;
mod report;

pub use dataset::{Case, CaseMetadata, Dataset};
pub use evaluators::{
    confidence_score, keyword_score, EvaluationResult, Evaluator, Grader, JudgeVerdict,
    ModelGrader,
};
pub use report::{CaseReport, PrintOptions, Report};
