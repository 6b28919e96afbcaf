//! Structured answers returned by the agents.
//!
//! Each output type carries the JSON schema sent to the model as a strict
//! `response_format`, plus any range checks the schema can't express.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

/// A type the model must produce as its final JSON answer.
pub trait StructuredOutput: Serialize + DeserializeOwned + Send + 'static {
    /// Schema name reported to the model.
    const NAME: &'static str;

    /// JSON schema of the output (strict mode compatible).
    fn json_schema() -> Value;

    /// Checks the schema can't enforce.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Parse and validate a final model message.
///
/// Tolerates a surrounding ```json fence.
pub fn parse_output<O: StructuredOutput>(content: &str) -> std::result::Result<O, String> {
    let trimmed = strip_code_fence(content.trim());
    if trimmed.is_empty() {
        return Err("Empty response".to_string());
    }

    let output: O = serde_json::from_str(trimmed).map_err(|e| format!("Invalid JSON: {}", e))?;
    output.validate()?;
    Ok(output)
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn check_confidence(value: i64) -> std::result::Result<(), String> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "confidence_percentage must be between 0 and 100, got {}",
            value
        ))
    }
}

/// Answer from the documentation agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotResponse {
    pub answer: String,
    pub reasoning: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub confidence_percentage: i64,
}

impl StructuredOutput for BotResponse {
    const NAME: &'static str = "bot_response";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The answer to the user's question"
                },
                "reasoning": {
                    "type": "string",
                    "description": "How the answer was reached"
                },
                "reference": {
                    "type": ["string", "null"],
                    "description": "Link to documentation or another resource backing the answer"
                },
                "confidence_percentage": {
                    "type": "integer",
                    "description": "Confidence in the answer, from 0 to 100"
                }
            },
            "required": ["answer", "reasoning", "reference", "confidence_percentage"],
            "additionalProperties": false
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        check_confidence(self.confidence_percentage)
    }
}

/// Answer from the browser automation agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpBotResponse {
    pub answer: String,
    pub reasoning: String,
    #[serde(default)]
    pub websites_accessed: Vec<String>,
    pub confidence_percentage: i64,
}

impl StructuredOutput for McpBotResponse {
    const NAME: &'static str = "mcp_bot_response";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The answer to the user's question"
                },
                "reasoning": {
                    "type": "string",
                    "description": "What was done in the browser to reach the answer"
                },
                "websites_accessed": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "URLs visited while answering"
                },
                "confidence_percentage": {
                    "type": "integer",
                    "description": "Confidence in the answer, from 0 to 100"
                }
            },
            "required": ["answer", "reasoning", "websites_accessed", "confidence_percentage"],
            "additionalProperties": false
        })
    }

    fn validate(&self) -> std::result::Result<(), String> {
        check_confidence(self.confidence_percentage)
    }
}
