//! CLI output formatting utilities.

use crate::agent::{BotResponse, McpBotResponse};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a docs agent answer.
    pub fn bot_response(response: &BotResponse) {
        println!("\n{}\n", response.answer);
        Output::kv("Reasoning", &response.reasoning);
        if let Some(reference) = &response.reference {
            Output::kv("Reference", reference);
        }
        Output::kv("Confidence", &confidence(response.confidence_percentage));
    }

    /// Print a browser agent answer.
    pub fn mcp_response(response: &McpBotResponse) {
        println!("\n{}\n", response.answer);
        Output::kv("Reasoning", &response.reasoning);
        Output::kv("Confidence", &confidence(response.confidence_percentage));
        if !response.websites_accessed.is_empty() {
            Output::header("Websites accessed");
            for site in &response.websites_accessed {
                Output::list_item(site);
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

fn confidence(percentage: i64) -> String {
    let text = format!("{}%", percentage);
    match percentage {
        80.. => style(text).green().to_string(),
        50..=79 => style(text).yellow().to_string(),
        _ => style(text).red().to_string(),
    }
}
