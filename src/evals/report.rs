//! Evaluation results and their terminal rendering.

use super::dataset::averages;
use super::evaluators::EvaluationResult;
use crate::agent::BotResponse;
use chrono::{DateTime, Utc};
use console::style;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of a single case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub name: String,
    pub question: String,
    pub output: Option<BotResponse>,
    /// Set when the task itself failed.
    pub error: Option<String>,
    pub task_duration: Duration,
    pub scores: Vec<EvaluationResult>,
    /// Evaluators that errored instead of producing a score.
    pub evaluator_failures: Vec<String>,
}

/// Outcome of a whole dataset run.
#[derive(Debug, Clone)]
pub struct Report {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub cases: Vec<CaseReport>,
    pub total_duration: Duration,
}

/// What to include when printing a report.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    pub include_input: bool,
    pub include_output: bool,
    pub include_durations: bool,
    pub include_averages: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            include_input: true,
            include_output: true,
            include_durations: true,
            include_averages: true,
        }
    }
}

impl Report {
    /// Number of cases whose task failed.
    pub fn failures(&self) -> usize {
        self.cases.iter().filter(|c| c.error.is_some()).count()
    }

    /// Average score per evaluator across all cases.
    pub fn averages(&self) -> Vec<(String, f64)> {
        let scores: Vec<&EvaluationResult> =
            self.cases.iter().flat_map(|c| c.scores.iter()).collect();
        averages(&scores)
    }

    /// Mean task duration over cases.
    pub fn average_duration(&self) -> Duration {
        if self.cases.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.cases.iter().map(|c| c.task_duration).sum();
        total / self.cases.len() as u32
    }

    pub fn print(&self, options: PrintOptions) {
        println!("\n{}", style("Evaluation Summary").bold().underlined());
        println!(
            "{}",
            style(format!(
                "run {} started {}",
                self.run_id,
                self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            ))
            .dim()
        );

        for case in &self.cases {
            let marker = if case.error.is_some() {
                style("FAIL").red().bold()
            } else {
                style("PASS").green().bold()
            };
            println!("\n{} {}", marker, style(&case.name).bold());

            if options.include_input {
                println!("  {}: {}", style("Question").dim(), case.question);
            }
            if options.include_output {
                if let Some(output) = &case.output {
                    println!("  {}: {}", style("Answer").dim(), preview(&output.answer, 300));
                    println!(
                        "  {}: {}%",
                        style("Confidence").dim(),
                        output.confidence_percentage
                    );
                    if let Some(reference) = &output.reference {
                        println!("  {}: {}", style("Reference").dim(), reference);
                    }
                }
            }
            if let Some(error) = &case.error {
                println!("  {}: {}", style("Error").dim(), style(error).red());
            }

            for score in &case.scores {
                let verdict = match score.passed {
                    Some(true) => format!(" {}", style("pass").green()),
                    Some(false) => format!(" {}", style("fail").red()),
                    None => String::new(),
                };
                println!(
                    "  {} {:<16} {:.2}{}",
                    style("*").cyan(),
                    score.evaluator,
                    score.score,
                    verdict
                );
                if let Some(reason) = &score.reason {
                    println!("      {}", style(preview(reason, 200)).dim());
                }
            }
            for failure in &case.evaluator_failures {
                println!("  {} {}", style("!").yellow(), failure);
            }

            if options.include_durations {
                println!(
                    "  {}: {:.1}s",
                    style("Duration").dim(),
                    case.task_duration.as_secs_f64()
                );
            }
        }

        if options.include_averages {
            println!("\n{}", style("Averages").bold());
            for (name, average) in self.averages() {
                println!("  {:<18} {:.2}", name, average);
            }
            if options.include_durations {
                println!(
                    "  {:<18} {:.1}s",
                    "task duration",
                    self.average_duration().as_secs_f64()
                );
            }
        }

        println!(
            "\n{} cases, {} failed, {:.1}s total",
            self.cases.len(),
            self.failures(),
            self.total_duration.as_secs_f64()
        );
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let text = text.replace('\n', " ");
    match text.char_indices().nth(max_chars) {
        None => text,
        Some((idx, _)) => format!("{}...", &text[..idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, secs: u64, score: f64, error: Option<&str>) -> CaseReport {
        CaseReport {
            name: name.to_string(),
            question: "q".to_string(),
            output: None,
            error: error.map(str::to_string),
            task_duration: Duration::from_secs(secs),
            scores: vec![EvaluationResult {
                evaluator: "Confidence".to_string(),
                score,
                passed: None,
                reason: None,
            }],
            evaluator_failures: Vec::new(),
        }
    }

    #[test]
    fn test_report_summaries() {
        let report = Report {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            cases: vec![case("a", 2, 1.0, None), case("b", 4, 0.5, Some("boom"))],
            total_duration: Duration::from_secs(5),
        };

        assert_eq!(report.failures(), 1);
        assert_eq!(report.average_duration(), Duration::from_secs(3));
        assert_eq!(report.averages(), vec![("Confidence".to_string(), 0.75)]);
        report.print(PrintOptions::default());
    }

    #[test]
    fn test_empty_report() {
        let report = Report {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            cases: Vec::new(),
            total_duration: Duration::ZERO,
        };
        assert_eq!(report.average_duration(), Duration::ZERO);
        assert!(report.averages().is_empty());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
