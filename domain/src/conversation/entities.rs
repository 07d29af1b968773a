//! Conversation entities

use crate::tool::ToolCallRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to an image, either remote or an inline `data:` URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One typed block of message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentBlock::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Message content: plain text for user/assistant turns, blocks for tool results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Flatten the content into displayable text.
    ///
    /// Image blocks are rendered as `[image]` so that a transcript can be
    /// printed without a graphical terminal.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => text.as_str(),
                    ContentBlock::ImageUrl { .. } => "[image]",
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// A message in a conversation (Entity)
///
/// Serialized form is what the transcript store writes to disk:
///
/// ```json
/// {"role": "tool", "content": [{"type": "text", "text": "..."}], "tool_call_id": "call_1"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(content.into())),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.map(MessageContent::Text),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(MessageContent::Blocks(blocks)),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text of the message, if it carries any content
    pub fn text(&self) -> Option<String> {
        self.content.as_ref().map(MessageContent::to_text)
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Violations of the transcript ordering rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("tool message has no tool_call_id")]
    MissingToolCallId,

    #[error("tool message references unknown or already answered tool call '{0}'")]
    UnmatchedToolCall(String),
}

/// Named, ordered, append-only sequence of messages (Entity)
///
/// Every `tool` message must answer a call emitted by the most recent
/// assistant message that has not been answered yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    name: String,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
        }
    }

    /// Rebuild a transcript from stored messages, checking every append.
    pub fn restore(
        name: impl Into<String>,
        messages: Vec<Message>,
    ) -> Result<Self, TranscriptError> {
        let mut transcript = Self::new(name);
        for message in messages {
            transcript.append(message)?;
        }
        Ok(transcript)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        if message.role == Role::Tool {
            let id = message
                .tool_call_id
                .as_deref()
                .ok_or(TranscriptError::MissingToolCallId)?;
            if !self.pending_tool_calls().iter().any(|call| call.id == id) {
                return Err(TranscriptError::UnmatchedToolCall(id.to_string()));
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Calls of the latest assistant message that have no tool result yet
    pub fn pending_tool_calls(&self) -> Vec<&ToolCallRequest> {
        let Some(index) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[index + 1..]
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages[index]
            .tool_calls
            .iter()
            .filter(|call| !answered.contains(&call.id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, name, json!({}))
    }

    #[test]
    fn test_tool_message_must_answer_pending_call() {
        let mut transcript = Transcript::new("host");
        transcript.append(Message::user("hi")).unwrap();
        transcript
            .append(Message::assistant(None, vec![call("c1", "a"), call("c2", "b")]))
            .unwrap();

        transcript
            .append(Message::tool_result("c2", vec![ContentBlock::text("b")]))
            .unwrap();
        assert_eq!(transcript.pending_tool_calls().len(), 1);

        let err = transcript
            .append(Message::tool_result("c2", vec![ContentBlock::text("again")]))
            .unwrap_err();
        assert_eq!(err, TranscriptError::UnmatchedToolCall("c2".to_string()));

        transcript
            .append(Message::tool_result("c1", vec![ContentBlock::text("a")]))
            .unwrap();
        assert!(transcript.pending_tool_calls().is_empty());
    }

    #[test]
    fn test_tool_message_without_assistant_is_rejected() {
        let mut transcript = Transcript::new("host");
        let err = transcript
            .append(Message::tool_result("c1", vec![]))
            .unwrap_err();
        assert_eq!(err, TranscriptError::UnmatchedToolCall("c1".to_string()));

        let mut message = Message::tool_result("c1", vec![]);
        message.tool_call_id = None;
        assert_eq!(
            transcript.append(message).unwrap_err(),
            TranscriptError::MissingToolCallId
        );
    }

    #[test]
    fn test_new_assistant_message_supersedes_old_calls() {
        let mut transcript = Transcript::new("host");
        transcript
            .append(Message::assistant(None, vec![call("c1", "a")]))
            .unwrap();
        transcript
            .append(Message::assistant(Some("done".into()), vec![]))
            .unwrap();
        assert!(transcript.pending_tool_calls().is_empty());
    }

    #[test]
    fn test_message_serialization_shape() {
        let message = Message::tool_result("call_1", vec![ContentBlock::text("ok")]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "tool",
                "content": [{"type": "text", "text": "ok"}],
                "tool_call_id": "call_1"
            })
        );

        let user: Message = serde_json::from_value(json!({"role": "user", "content": "hello"})).unwrap();
        assert_eq!(user.text().as_deref(), Some("hello"));
        assert!(user.tool_calls.is_empty());
    }

    #[test]
    fn test_blocks_to_text() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::text("first"),
            ContentBlock::image_url("data:image/png;base64,AAAA"),
        ]);
        assert_eq!(content.to_text(), "first\n[image]");
    }
}
