//! Configuration module for Trellis.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{BrowserPrompts, DocsPrompts, JudgePrompts, Prompts};
pub use settings::{
    AgentSettings, DatabaseSettings, EvalSettings, GeneralSettings, McpSettings,
    PromptSettings, ServerSettings, Settings, TavilySettings,
};
