//! OpenAI client construction.

use crate::error::{Result, TrellisError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client whose HTTP requests time out after `timeout`.
///
/// Credentials come from `OPENAI_API_KEY`; `OPENAI_BASE_URL` points the
/// client at a compatible server.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TrellisError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::default();
    if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
        if !base.is_empty() {
            config = config.with_api_base(base);
        }
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
