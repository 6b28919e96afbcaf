//! Trellis - arithmetic, items and LLM agents over HTTP
//!
//! A small JSON API backed by SQLite with two LLM agents behind it.
//!
//! # Overview
//!
//! Trellis serves:
//! - Arithmetic helpers (`/divide`, `/fibonacci`)
//! - Create, fetch and list operations over a single `items` table
//! - A PydanticAI documentation agent that searches the web with Tavily
//! - A browser agent that drives a Playwright MCP server
//!
//! Both agents answer with structured JSON including a confidence percentage.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `math` - Division and Fibonacci
//! - `store` - Item storage (SQLite or in-memory)
//! - `agent` - Tool-calling agent loop, Tavily search and the two assistants
//! - `mcp` - MCP client over stdio
//! - `api` - axum router and handlers
//! - `evals` - Evaluation dataset for the docs agent
//!
//! # Example
//!
//! ```rust,no_run
//! use trellis::api::{router, AppState};
//! use trellis::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let app = router(AppState::from_settings(&settings)?);
//!
//!     let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod evals;
pub mod math;
pub mod mcp;
pub mod openai;
pub mod store;

pub use error::{Result, TrellisError};
