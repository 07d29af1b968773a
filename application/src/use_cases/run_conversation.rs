//! Run Conversation use case
//!
//! Drives one user turn of a tool-augmented conversation:
//!
//! ```text
//! AwaitingUserInput -> Inferring -> (DispatchingTools -> Inferring)* -> AwaitingUserInput
//! ```
//!
//! The transcript is persisted after every appended message, so a crash at
//! any point leaves the stored transcript at the last completed step.
//! Tool calls of one assistant turn run sequentially in the order the model
//! requested them.

use crate::config::ConversationParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::inference::{InferenceError, InferenceProvider, InferenceRequest};
use crate::ports::progress::{HostProgressNotifier, NoProgress};
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use crate::registry::{DispatchError, SessionRegistry};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use toolhost_domain::{
    Message, ToolCallRequest, ToolCallResult, Transcript, TranscriptError, TurnState,
    strip_input_marker,
};
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 120;

/// Errors that end a turn early
///
/// The stored transcript is left at its last persisted state, so the turn
/// can be retried once the cause is fixed.
#[derive(Error, Debug)]
pub enum RunConversationError {
    #[error("Transcript store error: {0}")]
    Store(#[from] StoreError),

    #[error("Stored transcript is inconsistent: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Tool dispatch failed: {0}")]
    Tool(#[from] DispatchError),

    #[error("Stopped after {0} tool rounds without a final answer")]
    MaxRoundsExceeded(usize),
}

impl RunConversationError {
    /// Whether resending the same message can succeed without a restart
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RunConversationError::Inference(_) | RunConversationError::MaxRoundsExceeded(_)
        )
    }

    /// Backend whose session broke during the turn. It stays registered, so
    /// its tools keep failing until the host is restarted.
    pub fn failed_backend(&self) -> Option<&str> {
        match self {
            RunConversationError::Tool(
                DispatchError::Protocol { backend, .. } | DispatchError::Connection { backend, .. },
            ) => Some(backend),
            _ => None,
        }
    }
}

/// Input for the RunConversation use case
#[derive(Debug, Clone)]
pub struct RunConversationInput {
    /// Name of the conversation (transcript key)
    pub conversation: String,
    /// The user message
    pub message: String,
}

impl RunConversationInput {
    pub fn new(conversation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            conversation: conversation.into(),
            message: message.into(),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without requesting tools
    Completed,
    /// The model asked the user for more information
    InputRequired,
}

/// Output of the RunConversation use case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConversationOutput {
    /// Final assistant text, with the input-required marker removed
    pub reply: String,
    pub outcome: TurnOutcome,
    /// Number of dispatch rounds in this turn
    pub rounds: usize,
    /// Length of the transcript after the turn
    pub message_count: usize,
}

/// Use case for running one turn of a conversation
pub struct RunConversationUseCase<I: InferenceProvider + 'static, S: TranscriptStore + 'static> {
    inference: Arc<I>,
    store: Arc<S>,
    registry: Arc<SessionRegistry>,
    params: ConversationParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<I: InferenceProvider + 'static, S: TranscriptStore + 'static> RunConversationUseCase<I, S> {
    pub fn new(inference: Arc<I>, store: Arc<S>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            inference,
            store,
            registry,
            params: ConversationParams::default(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_params(mut self, params: ConversationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn model(&self) -> &str {
        self.inference.model()
    }

    /// Stored messages of a conversation
    pub async fn history(&self, conversation: &str) -> Result<Vec<Message>, RunConversationError> {
        Ok(self.store.load(conversation).await?)
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunConversationInput,
    ) -> Result<RunConversationOutput, RunConversationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunConversationInput,
        progress: &dyn HostProgressNotifier,
    ) -> Result<RunConversationOutput, RunConversationError> {
        let result = self.run_turn(&input, progress).await;
        progress.on_state_change(TurnState::AwaitingUserInput);

        if let Err(error) = &result {
            warn!(conversation = %input.conversation, error = %error, "Turn aborted");
            self.conversation_logger.log(ConversationEvent::new(
                "turn_error",
                json!({
                    "conversation": input.conversation,
                    "error": error.to_string(),
                }),
            ));
        }
        result
    }

    async fn run_turn(
        &self,
        input: &RunConversationInput,
        progress: &dyn HostProgressNotifier,
    ) -> Result<RunConversationOutput, RunConversationError> {
        let stored = self.store.load(&input.conversation).await?;
        let mut transcript = Transcript::restore(input.conversation.clone(), stored)?;
        self.resolve_interrupted_calls(&mut transcript).await?;

        info!(
            conversation = %input.conversation,
            history = transcript.len(),
            "Starting turn"
        );
        self.append(&mut transcript, Message::user(input.message.clone()))
            .await?;
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            json!({
                "conversation": input.conversation,
                "text": input.message,
            }),
        ));

        let mut rounds = 0;
        loop {
            progress.on_state_change(TurnState::Inferring);
            progress.on_inference_start(rounds + 1);

            let turn = self
                .inference
                .infer(InferenceRequest {
                    messages: transcript.messages(),
                    tools: self.registry.tools(),
                })
                .await?;
            progress.on_inference_complete(rounds + 1, turn.tool_calls.len());

            let (content, input_required) = match turn.content {
                Some(text) => match strip_input_marker(&text, &self.params.input_required_marker) {
                    Some(stripped) => (Some(stripped.to_string()), true),
                    None => (Some(text), false),
                },
                None => (None, false),
            };

            let mut tool_calls = if input_required {
                if !turn.tool_calls.is_empty() {
                    debug!(
                        dropped = turn.tool_calls.len(),
                        "Input required, ignoring requested tool calls"
                    );
                }
                Vec::new()
            } else {
                turn.tool_calls
            };
            assign_unique_call_ids(&mut tool_calls, rounds + 1);

            self.append(
                &mut transcript,
                Message::assistant(content.clone(), tool_calls.clone()),
            )
            .await?;
            self.conversation_logger.log(ConversationEvent::new(
                "llm_response",
                json!({
                    "conversation": input.conversation,
                    "round": rounds + 1,
                    "model": self.inference.model(),
                    "content": content,
                    "tool_calls": tool_calls,
                    "input_required": input_required,
                }),
            ));

            if input_required || tool_calls.is_empty() {
                if input_required {
                    progress.on_input_required();
                }
                info!(rounds, messages = transcript.len(), "Turn finished");
                return Ok(RunConversationOutput {
                    reply: content.unwrap_or_default(),
                    outcome: if input_required {
                        TurnOutcome::InputRequired
                    } else {
                        TurnOutcome::Completed
                    },
                    rounds,
                    message_count: transcript.len(),
                });
            }

            if let Some(max) = self.params.max_tool_rounds.filter(|max| rounds >= *max) {
                let skipped = ToolCallResult::error(format!(
                    "Error: tool call skipped, the limit of {} tool rounds per turn was reached",
                    max
                ));
                for call in &tool_calls {
                    self.append(
                        &mut transcript,
                        Message::tool_result(call.id.clone(), skipped.render_blocks()),
                    )
                    .await?;
                }
                return Err(RunConversationError::MaxRoundsExceeded(max));
            }

            rounds += 1;
            progress.on_state_change(TurnState::DispatchingTools);
            for call in &tool_calls {
                let result = self.dispatch(&input.conversation, call, progress).await?;
                self.append(
                    &mut transcript,
                    Message::tool_result(call.id.clone(), result.render_blocks()),
                )
                .await?;
            }
        }
    }

    /// Dispatch one call. Recoverable errors become the tool result.
    async fn dispatch(
        &self,
        conversation: &str,
        call: &ToolCallRequest,
        progress: &dyn HostProgressNotifier,
    ) -> Result<ToolCallResult, RunConversationError> {
        progress.on_tool_start(call);
        self.conversation_logger.log(ConversationEvent::new(
            "tool_call",
            json!({
                "conversation": conversation,
                "id": call.id,
                "tool": call.name,
                "arguments": call.arguments,
                "backend": self.registry.owner_of(&call.name),
            }),
        ));

        let result = match self
            .registry
            .dispatch(&call.name, call.arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(error) if error.is_recoverable() => {
                warn!(tool = %call.name, error = %error, "Tool call failed, reporting to model");
                error.to_tool_result()
            }
            Err(error) => return Err(error.into()),
        };

        let text = result.render_text();
        progress.on_tool_complete(call, !result.is_error, &preview(&text));
        self.conversation_logger.log(ConversationEvent::new(
            "tool_result",
            json!({
                "conversation": conversation,
                "id": call.id,
                "tool": call.name,
                "is_error": result.is_error,
                "text": text,
            }),
        ));
        Ok(result)
    }

    /// Answer calls left pending by an aborted turn so the transcript is
    /// valid input for the model again.
    async fn resolve_interrupted_calls(
        &self,
        transcript: &mut Transcript,
    ) -> Result<(), RunConversationError> {
        let pending: Vec<String> = transcript
            .pending_tool_calls()
            .iter()
            .map(|call| call.id.clone())
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        warn!(
            count = pending.len(),
            "Previous turn ended with unanswered tool calls"
        );
        let interrupted =
            ToolCallResult::error("Error: tool call was interrupted before a result was recorded");
        for id in pending {
            self.append(transcript, Message::tool_result(id, interrupted.render_blocks()))
                .await?;
        }
        Ok(())
    }

    async fn append(
        &self,
        transcript: &mut Transcript,
        message: Message,
    ) -> Result<(), RunConversationError> {
        transcript.append(message)?;
        self.store
            .persist(transcript.name(), transcript.messages())
            .await?;
        Ok(())
    }
}

/// Replace empty or repeated call ids with `call_<round>_<index>` so every
/// call can be answered by exactly one tool message.
fn assign_unique_call_ids(calls: &mut [ToolCallRequest], round: usize) {
    let original: HashSet<String> = calls
        .iter()
        .filter(|call| !call.id.is_empty())
        .map(|call| call.id.clone())
        .collect();
    let mut used = HashSet::new();

    for (index, call) in calls.iter_mut().enumerate() {
        if !call.id.is_empty() && used.insert(call.id.clone()) {
            continue;
        }

        let mut id = format!("call_{}_{}", round, index);
        while original.contains(&id) || used.contains(&id) {
            id.push('_');
        }
        debug!(tool = %call.name, from = %call.id, to = %id, "Assigned tool call id");
        used.insert(id.clone());
        call.id = id;
    }
}

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let truncated: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        first_line.to_string()
    }
}
