//! CLI module for Trellis.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// The original demo question for the browser agent.
pub const DEFAULT_BROWSE_QUESTION: &str = "Navigate to pydantic.dev and get information about their latest blog post or announcement. Summarize what you find.";

/// Trellis - arithmetic, items and LLM agents over HTTP
///
/// Serves a small JSON API backed by SQLite, plus a PydanticAI docs agent
/// with web search and a browser agent driven through an MCP server.
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the PydanticAI docs agent a question
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Give the browser agent a task through the MCP server
    Browse {
        /// The task for the browser agent
        #[arg(default_value = DEFAULT_BROWSE_QUESTION)]
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Run the docs agent evaluation dataset
    Evals {
        /// Dataset file (JSON); the built-in dataset is used when omitted
        #[arg(short, long)]
        dataset: Option<String>,

        /// Write the dataset to this file after the run
        #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
        save: Option<String>,

        /// Maximum cases evaluated at once (defaults to evals.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Check API keys, the MCP server command and the database
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
