//! Conversion between domain messages and the chat completions JSON shape.

use serde_json::{Value, json};
use toolhost_application::{AssistantTurn, InferenceError};
use toolhost_domain::{ContentBlock, Message, MessageContent, Role, ToolCallRequest, ToolDescriptor};

pub(crate) fn build_messages(messages: &[Message]) -> Vec<Value> {
    messages.iter().map(message_to_json).collect()
}

fn message_to_json(message: &Message) -> Value {
    let mut out = json!({
        "role": message.role.as_str(),
        "content": content_to_json(message.content.as_ref()),
    });

    if message.role == Role::Assistant && !message.tool_calls.is_empty() {
        let calls: Vec<Value> = message.tool_calls.iter().map(tool_call_to_json).collect();
        out["tool_calls"] = Value::Array(calls);
    }
    if let Some(id) = &message.tool_call_id {
        out["tool_call_id"] = json!(id);
    }
    out
}

fn content_to_json(content: Option<&MessageContent>) -> Value {
    match content {
        None => Value::Null,
        Some(MessageContent::Text(text)) => json!(text),
        Some(MessageContent::Blocks(blocks)) => {
            // Text-only block lists collapse to a string; servers differ in
            // whether they accept part arrays on tool messages.
            let all_text = blocks
                .iter()
                .all(|b| matches!(b, ContentBlock::Text { .. }));
            if all_text {
                let text: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        ContentBlock::ImageUrl { .. } => None,
                    })
                    .collect();
                json!(text.join("\n"))
            } else {
                json!(blocks)
            }
        }
    }
}

fn tool_call_to_json(call: &ToolCallRequest) -> Value {
    let arguments = match &call.arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };
    json!({
        "id": call.id,
        "type": "function",
        "function": {
            "name": call.name,
            "arguments": arguments,
        }
    })
}

pub(crate) fn build_tools(tools: &[ToolDescriptor]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                }
            })
        })
        .collect()
}

/// Extract the first choice of a chat completions response.
pub(crate) fn parse_response(body: &Value) -> Result<AssistantTurn, InferenceError> {
    let message = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| InferenceError::InvalidResponse("response has no choices".into()))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            tool_calls.push(parse_tool_call(call)?);
        }
    }

    Ok(AssistantTurn {
        content,
        tool_calls,
    })
}

fn parse_tool_call(call: &Value) -> Result<ToolCallRequest, InferenceError> {
    let id = call
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| InferenceError::InvalidResponse("tool call without id".into()))?;
    let function = call
        .get("function")
        .ok_or_else(|| InferenceError::InvalidResponse(format!("tool call {} without function", id)))?;
    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| InferenceError::InvalidResponse(format!("tool call {} without name", id)))?;

    Ok(ToolCallRequest::new(
        id,
        name,
        parse_arguments(function.get("arguments")),
    ))
}

/// Arguments arrive as a JSON-encoded string. A string that does not parse is
/// kept as-is so the registry can reject it as invalid arguments.
fn parse_arguments(raw: Option<&Value>) -> Value {
    match raw {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(Value::String(s)) if s.trim().is_empty() => Value::Object(Default::default()),
        Some(Value::String(s)) => {
            serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))
        }
        Some(other) => other.clone(),
    }
}
