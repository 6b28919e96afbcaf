//! Shared application state.

use crate::agent::{
    Assistant, BotResponse, BrowserAssistant, DocsAssistant, McpBotResponse, UnavailableAssistant,
};
use crate::config::{Prompts, Settings};
use crate::error::{Result, TrellisError};
use crate::store::{open_store, ItemStore};
use std::sync::Arc;
use tracing::warn;

pub type DocsAgent = Arc<dyn Assistant<Output = BotResponse>>;
pub type BrowserAgent = Arc<dyn Assistant<Output = McpBotResponse>>;

#[derive(Clone)]
pub struct AppState {
    /// Item storage.
    pub store: Arc<dyn ItemStore>,

    /// Documentation agent behind `/agent/query`.
    pub docs: DocsAgent,

    /// Browser agent behind `/mcp/query`.
    pub browser: BrowserAgent,

    /// Upper bound for the `limit` query parameter.
    pub max_page_size: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>, docs: DocsAgent, browser: BrowserAgent) -> Self {
        Self {
            store,
            docs,
            browser,
            max_page_size: 1000,
        }
    }

    pub fn with_max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = max;
        self
    }

    /// Build state from settings.
    ///
    /// The store must open. An agent that can't be configured is replaced by
    /// one that reports the configuration problem on every query.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = open_store(&settings.database.url)?;
        let prompts = Prompts::from_settings(settings)?;

        let docs: DocsAgent = match DocsAssistant::from_settings(settings, &prompts) {
            Ok(assistant) => Arc::new(assistant),
            Err(e) => {
                warn!("Docs agent unavailable: {}", e);
                Arc::new(UnavailableAssistant::<BotResponse>::new(reason(e)))
            }
        };

        let browser: BrowserAgent = match BrowserAssistant::from_settings(settings, &prompts) {
            Ok(assistant) => Arc::new(assistant),
            Err(e) => {
                warn!("Browser agent unavailable: {}", e);
                Arc::new(UnavailableAssistant::<McpBotResponse>::new(reason(e)))
            }
        };

        Ok(Self::new(store, docs, browser).with_max_page_size(settings.database.max_page_size))
    }
}

fn reason(err: TrellisError) -> String {
    match err {
        TrellisError::Config(msg) => msg,
        other => other.to_string(),
    }
}
