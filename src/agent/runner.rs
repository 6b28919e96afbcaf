//! Agent runner with tool calling loop.

use super::output::{parse_output, StructuredOutput};
use super::tools::ToolProvider;
use crate::error::{Result, TrellisError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One assistant turn returned by the model.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
    pub refusal: Option<String>,
}

/// Something that can complete a chat request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: CreateChatCompletionRequest) -> Result<ModelTurn>;
}

/// Chat backend talking to the OpenAI API.
pub struct OpenAIBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAIBackend {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    async fn chat(&self, request: CreateChatCompletionRequest) -> Result<ModelTurn> {
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TrellisError::OpenAI(format!("Agent API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TrellisError::Agent("No response from model".to_string()))?;

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
            refusal: choice.message.refusal,
        })
    }
}

/// Agent that answers a question with tools and a structured final answer.
pub struct Agent<O> {
    backend: Arc<dyn ChatBackend>,
    model: String,
    max_iterations: usize,
    output_retries: usize,
    system_prompt: String,
    _output: PhantomData<fn() -> O>,
}

impl<O: StructuredOutput> Agent<O> {
    /// Create a new agent using `model` through `backend`.
    pub fn new(backend: Arc<dyn ChatBackend>, model: &str, system_prompt: &str) -> Self {
        Self {
            backend,
            model: model.to_string(),
            max_iterations: 10,
            output_retries: 1,
            system_prompt: system_prompt.to_string(),
            _output: PhantomData,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set how many times an invalid final answer is sent back for correction.
    pub fn with_output_retries(mut self, retries: usize) -> Self {
        self.output_retries = retries;
        self
    }

    /// Model this agent runs on.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run the agent on a user task.
    pub async fn run(&self, tools: &dyn ToolProvider, task: &str) -> Result<AgentResponse<O>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| TrellisError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(task.to_string())
                .build()
                .map_err(|e| TrellisError::Agent(e.to_string()))?
                .into(),
        ];

        let definitions = tools.definitions();
        let mut iterations = 0;
        let mut retries = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(TrellisError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let mut builder = CreateChatCompletionRequestArgs::default();
            builder
                .model(&self.model)
                .messages(messages.clone())
                .response_format(ResponseFormat::JsonSchema {
                    json_schema: ResponseFormatJsonSchema {
                        description: None,
                        name: O::NAME.to_string(),
                        schema: Some(O::json_schema()),
                        strict: Some(true),
                    },
                });
            if !definitions.is_empty() {
                builder.tools(definitions.clone());
            }
            let request = builder
                .build()
                .map_err(|e| TrellisError::Agent(e.to_string()))?;

            let turn = self.backend.chat(request).await?;

            if let Some(refusal) = turn.refusal {
                return Err(TrellisError::Agent(format!("Model refused: {}", refusal)));
            }

            if !turn.tool_calls.is_empty() {
                let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(turn.tool_calls.clone())
                    .build()
                    .map_err(|e| TrellisError::Agent(e.to_string()))?;
                messages.push(assistant_msg.into());

                for tool_call in &turn.tool_calls {
                    let record = self.execute_tool_call(tools, tool_call).await;

                    let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&tool_call.id)
                        .content(record.result.clone())
                        .build()
                        .map_err(|e| TrellisError::Agent(e.to_string()))?;
                    messages.push(tool_msg.into());

                    tool_calls_made.push(record);
                }
                continue;
            }

            let content = turn.content.unwrap_or_default();
            match parse_output::<O>(&content) {
                Ok(output) => {
                    return Ok(AgentResponse {
                        output,
                        tool_calls: tool_calls_made,
                        iterations,
                    });
                }
                Err(e) if retries < self.output_retries => {
                    retries += 1;
                    warn!("Agent output rejected ({}), asking for a correction", e);

                    messages.push(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .content(content)
                            .build()
                            .map_err(|e| TrellisError::Agent(e.to_string()))?
                            .into(),
                    );
                    messages.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(format!(
                                "Your response could not be validated: {}. \
                                Respond again with a JSON object matching the required schema.",
                                e
                            ))
                            .build()
                            .map_err(|e| TrellisError::Agent(e.to_string()))?
                            .into(),
                    );
                }
                Err(e) => {
                    return Err(TrellisError::Agent(format!(
                        "Invalid structured output: {}",
                        e
                    )));
                }
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(
        &self,
        tools: &dyn ToolProvider,
        tool_call: &ChatCompletionMessageToolCall,
    ) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match tools.call(name, arguments).await {
            Ok(output) => output,
            Err(e) => format!("Tool error: {}", e),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse<O> {
    /// The validated final answer.
    pub output: O,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::output::BotResponse;
    use crate::agent::tools::NoTools;
    use async_openai::types::{ChatCompletionToolType, FunctionCall};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays canned turns and records request sizes.
    pub(crate) struct ScriptedBackend {
        turns: Mutex<VecDeque<ModelTurn>>,
        pub(crate) seen_messages: Mutex<Vec<usize>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen_messages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, request: CreateChatCompletionRequest) -> Result<ModelTurn> {
            self.seen_messages.lock().unwrap().push(request.messages.len());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TrellisError::Agent("script exhausted".to_string()))
        }
    }

    pub(crate) fn answer(content: &str) -> ModelTurn {
        ModelTurn {
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    pub(crate) fn tool_turn(name: &str, arguments: &str) -> ModelTurn {
        ModelTurn {
            tool_calls: vec![ChatCompletionMessageToolCall {
                id: format!("call_{}", name),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
            ..Default::default()
        }
    }

    struct EchoTools;

    #[async_trait]
    impl ToolProvider for EchoTools {
        fn definitions(&self) -> Vec<async_openai::types::ChatCompletionTool> {
            crate::agent::tools::tool_definitions()
        }

        async fn call(&self, name: &str, arguments: &str) -> Result<String> {
            Ok(format!("{} -> {}", name, arguments))
        }
    }

    const GOOD: &str =
        r#"{"answer": "Use Agent()", "reasoning": "docs", "reference": "https://ai.pydantic.dev/", "confidence_percentage": 85}"#;

    #[tokio::test]
    async fn test_direct_answer() {
        let backend = Arc::new(ScriptedBackend::new(vec![answer(GOOD)]));
        let agent: Agent<BotResponse> = Agent::new(backend.clone(), "gpt-4.1", "system");

        let response = agent.run(&NoTools, "How do I create an agent?").await.unwrap();
        assert_eq!(response.output.confidence_percentage, 85);
        assert_eq!(response.iterations, 1);
        assert!(response.tool_calls.is_empty());
        assert_eq!(*backend.seen_messages.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_turn("tavily_search", r#"{"query": "pydantic ai"}"#),
            answer(GOOD),
        ]));
        let agent: Agent<BotResponse> = Agent::new(backend.clone(), "gpt-4.1", "system");

        let response = agent.run(&EchoTools, "question").await.unwrap();
        assert_eq!(response.iterations, 2);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(
            response.tool_calls[0].result,
            r#"tavily_search -> {"query": "pydantic ai"}"#
        );
        // system + user, then + assistant tool call + tool result
        assert_eq!(*backend.seen_messages.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_tool_errors_are_fed_back() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_turn("missing_tool", "{}"),
            answer(GOOD),
        ]));
        let agent: Agent<BotResponse> = Agent::new(backend, "gpt-4.1", "system");

        let response = agent.run(&NoTools, "question").await.unwrap();
        assert!(response.tool_calls[0].result.starts_with("Tool error:"));
    }

    #[tokio::test]
    async fn test_invalid_output_is_retried() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            answer(r#"{"answer": "a", "reasoning": "r", "reference": null, "confidence_percentage": 400}"#),
            answer(GOOD),
        ]));
        let agent: Agent<BotResponse> = Agent::new(backend.clone(), "gpt-4.1", "system");

        let response = agent.run(&NoTools, "question").await.unwrap();
        assert_eq!(response.iterations, 2);
        assert_eq!(*backend.seen_messages.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_invalid_output_exhausts_retries() {
        let backend = Arc::new(ScriptedBackend::new(vec![answer("nope"), answer("still nope")]));
        let agent: Agent<BotResponse> =
            Agent::new(backend, "gpt-4.1", "system").with_output_retries(1);

        let err = agent.run(&NoTools, "question").await.unwrap_err();
        assert!(err.to_string().contains("Invalid structured output"));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_turn("tavily_search", r#"{"query": "a"}"#),
            tool_turn("tavily_search", r#"{"query": "b"}"#),
            tool_turn("tavily_search", r#"{"query": "c"}"#),
        ]));
        let agent: Agent<BotResponse> =
            Agent::new(backend, "gpt-4.1", "system").with_max_iterations(2);

        let err = agent.run(&EchoTools, "question").await.unwrap_err();
        assert!(err.to_string().contains("maximum iterations (2)"));
    }

    #[tokio::test]
    async fn test_refusal() {
        let backend = Arc::new(ScriptedBackend::new(vec![ModelTurn {
            refusal: Some("I can't help with that".to_string()),
            ..Default::default()
        }]));
        let agent: Agent<BotResponse> = Agent::new(backend, "gpt-4.1", "system");

        let err = agent.run(&NoTools, "question").await.unwrap_err();
        assert!(err.to_string().contains("Model refused"));
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "tavily_search".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "[]".to_string(),
        };
        assert_eq!(format!("{}", record), r#"tavily_search({"query": "test"})"#);
    }
}
