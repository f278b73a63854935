//! The agent orchestration loop implementation.

use std::sync::Arc;
use std::time::Duration;
use tinyagent_config::AgentConfig;
use tinyagent_core::error::{Error, Result};
use tinyagent_core::message::{Message, Role};
use tinyagent_core::provider::Provider;
use tinyagent_core::tool::ToolRegistry;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::dispatch::{ToolCall, dispatch_batch};
use crate::event::AgentEvent;

/// Drives a conversation between a provider and a tool registry.
///
/// The transcript lives as long as the loop; successive calls to
/// [`AgentLoop::run`] continue the same conversation.
pub struct AgentLoop {
    /// The completion provider
    provider: Arc<dyn Provider>,

    /// Tool registry, read-only for the loop
    tools: Arc<ToolRegistry>,

    /// Append-only transcript
    messages: Vec<Message>,

    /// Completions allowed per run before giving up; `None` is unbounded
    max_turns: Option<u32>,

    /// Deadline for each tool invocation
    tool_timeout: Option<Duration>,

    /// Observer for tool activity
    events: Option<UnboundedSender<AgentEvent>>,

    /// Tags tracing output for this conversation
    conversation_id: Uuid,
}

impl AgentLoop {
    /// Create a new agent loop with an empty transcript.
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            messages: Vec::new(),
            max_turns: None,
            tool_timeout: None,
            events: None,
            conversation_id: Uuid::new_v4(),
        }
    }

    /// Apply the `[agent]` section of the configuration.
    pub fn with_config(mut self, config: &AgentConfig) -> Self {
        if let Some(prompt) = &config.system_prompt {
            self = self.with_system_prompt(prompt.clone());
        }
        if let Some(max) = config.max_turns {
            self = self.with_max_turns(max);
        }
        if let Some(secs) = config.tool_timeout_secs {
            self = self.with_tool_timeout(Duration::from_secs(secs));
        }
        self
    }

    /// Seed the transcript with a system message, replacing any earlier one.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let system = Message::system(prompt);
        match self.messages.first() {
            Some(first) if first.role == Role::System => self.messages[0] = system,
            _ => self.messages.insert(0, system),
        }
        self
    }

    /// Fail a run with `Error::TurnLimitExceeded` after this many
    /// completions without a final answer. At least one is always allowed.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns.max(1));
        self
    }

    /// Report any tool invocation running longer than `timeout` as failed.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Send an [`AgentEvent`] before and after every tool invocation.
    pub fn with_event_sink(mut self, sink: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    /// The transcript so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }

    /// Run one instruction to completion and return the final text.
    ///
    /// 1. Append the instruction as a user message
    /// 2. Ask the provider for a completion and record it verbatim
    /// 3. If it requests tools: run them all concurrently, append one tool
    ///    message per request in request order, and go back to 2
    /// 4. Otherwise return its text blocks concatenated
    ///
    /// Only provider failures (and the optional turn limit) end a run with
    /// an error; tool failures are reported to the model instead.
    pub async fn run(&mut self, input: impl Into<String>) -> Result<String> {
        let span = info_span!("agent_run", conversation_id = %self.conversation_id);
        self.run_turns(input.into()).instrument(span).await
    }

    async fn run_turns(&mut self, input: String) -> Result<String> {
        info!(messages = self.messages.len(), "Starting run");
        self.messages.push(Message::user(input));

        let schemas = self.tools.export_schemas();
        let mut turn: u32 = 0;

        loop {
            if let Some(max) = self.max_turns
                && turn >= max
            {
                warn!(max_turns = max, "Turn limit reached without a final answer");
                return Err(Error::TurnLimitExceeded { max_turns: max });
            }
            turn += 1;

            debug!(turn, messages = self.messages.len(), "Requesting completion");
            let response = self.provider.complete(&self.messages, &schemas).await?;

            if !response.has_tool_use() {
                let assistant = Message::assistant(response.content);
                let text = assistant.content.text();
                self.messages.push(assistant);
                info!(turns = turn, "Run complete");
                return Ok(text);
            }

            let calls: Vec<ToolCall> = response
                .content
                .iter()
                .filter_map(ToolCall::from_block)
                .collect();
            self.messages.push(Message::assistant(response.content));
            debug!(turn, tool_count = calls.len(), "Executing tool calls");

            let results =
                dispatch_batch(&self.tools, &calls, self.tool_timeout, self.events.as_ref()).await;

            for (call, result) in calls.iter().zip(results) {
                self.messages
                    .push(Message::tool_result(call.id.clone(), result.content()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tinyagent_core::error::ProviderError;
    use tinyagent_core::message::{ContentBlock, ToolInput};
    use tinyagent_core::provider::{CompletionResponse, ToolDefinition};

    /// Replays scripted completions and records what it was sent.
    struct MockProvider {
        responses: Mutex<Vec<Vec<ContentBlock>>>,
        seen: Mutex<Vec<usize>>,
    }

    impl MockProvider {
        fn new(responses: Vec<Vec<ContentBlock>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(messages.len());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(ProviderError::InvalidResponse("script exhausted".into()));
            }
            Ok(CompletionResponse::new(responses.remove(0)))
        }
    }

    fn looping_tool_use() -> Vec<ContentBlock> {
        vec![ContentBlock::tool_use("t", "nothing", ToolInput::new())]
    }

    #[tokio::test]
    async fn simple_text_response() {
        let provider = Arc::new(MockProvider::new(vec![vec![ContentBlock::text(
            "Hello! How can I help?",
        )]]));
        let mut agent = AgentLoop::new(provider.clone(), Arc::new(ToolRegistry::new()));

        let reply = agent.run("Hi").await.unwrap();

        assert_eq!(reply, "Hello! How can I help?");
        assert_eq!(provider.calls(), 1);
        assert_eq!(agent.messages().len(), 2);
        assert_eq!(agent.messages()[0].role, Role::User);
        assert_eq!(agent.messages()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn text_blocks_are_concatenated() {
        let provider = Arc::new(MockProvider::new(vec![vec![
            ContentBlock::text("Hello, "),
            ContentBlock::text("world"),
        ]]));
        let mut agent = AgentLoop::new(provider, Arc::new(ToolRegistry::new()));
        assert_eq!(agent.run("greet").await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn empty_completion_yields_empty_string() {
        let provider = Arc::new(MockProvider::new(vec![vec![]]));
        let mut agent = AgentLoop::new(provider, Arc::new(ToolRegistry::new()));
        assert_eq!(agent.run("say nothing").await.unwrap(), "");
    }

    #[tokio::test]
    async fn system_prompt_seeds_transcript_once() {
        let provider = Arc::new(MockProvider::new(vec![
            vec![ContentBlock::text("one")],
            vec![ContentBlock::text("two")],
        ]));
        let mut agent = AgentLoop::new(provider.clone(), Arc::new(ToolRegistry::new()))
            .with_system_prompt("first")
            .with_system_prompt("You are terse.");

        agent.run("a").await.unwrap();
        agent.run("b").await.unwrap();

        let messages = agent.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], Message::system("You are terse."));
        assert_eq!(messages[3], Message::user("b"));
        // the second run saw the whole first exchange
        assert_eq!(*provider.seen.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn turn_limit_is_an_error() {
        let provider = Arc::new(MockProvider::new(vec![
            looping_tool_use(),
            looping_tool_use(),
            looping_tool_use(),
        ]));
        let mut agent =
            AgentLoop::new(provider.clone(), Arc::new(ToolRegistry::new())).with_max_turns(2);

        let err = agent.run("loop forever").await.unwrap_err();

        assert!(matches!(err, Error::TurnLimitExceeded { max_turns: 2 }));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let mut agent = AgentLoop::new(provider, Arc::new(ToolRegistry::new()));

        let err = agent.run("hi").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn config_applies_builders() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let config = AgentConfig {
            system_prompt: Some("Be brief".into()),
            max_turns: Some(0),
            tool_timeout_secs: Some(5),
        };
        let agent = AgentLoop::new(provider, Arc::new(ToolRegistry::new())).with_config(&config);

        assert_eq!(agent.messages(), &[Message::system("Be brief")]);
        assert_eq!(agent.max_turns, Some(1));
        assert_eq!(agent.tool_timeout, Some(Duration::from_secs(5)));
    }
}
