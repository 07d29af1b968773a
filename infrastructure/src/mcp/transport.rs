//! Transport layer for MCP stdio communication.
//!
//! Messages are newline-delimited JSON. [`classify_message`] tells the
//! session's background reader how to dispatch each frame.

use serde::Serialize;
use serde_json::Value;

/// Classification of an incoming JSON-RPC message.
///
/// - `Response` → oneshot correlation for pending requests
/// - `IncomingRequest` → answered by the reader (`ping`) or rejected
/// - `Notification` → logged
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response,
    /// A request from the server (has `id` + `method`). Server ids may be
    /// numbers or strings, so the raw value is kept for the reply.
    IncomingRequest { id: Value },
    /// A notification (has `method`, no `id`).
    Notification,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let id = json.get("id").filter(|id| !id.is_null());
    let has_method = json.get("method").and_then(|v| v.as_str()).is_some();

    match (id, has_method) {
        (Some(id), true) => MessageKind::IncomingRequest { id: id.clone() },
        (Some(_), false) => MessageKind::Response,
        _ => MessageKind::Notification,
    }
}

/// Encode one message as a single line (trailing `\n` included).
pub fn encode_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_response() {
        let json = json!({"jsonrpc": "2.0", "id": 1, "result": {}});
        assert_eq!(classify_message(&json), MessageKind::Response);
    }

    #[test]
    fn classify_incoming_request_with_string_id() {
        let json = json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"});
        assert_eq!(
            classify_message(&json),
            MessageKind::IncomingRequest { id: json!("abc") }
        );
    }

    #[test]
    fn classify_notification() {
        let json = json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {}});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn classify_null_id_as_notification() {
        let json = json!({"jsonrpc": "2.0", "id": null, "method": "x"});
        assert_eq!(classify_message(&json), MessageKind::Notification);
    }

    #[test]
    fn encode_line_is_single_line() {
        let line = encode_line(&json!({"text": "a\nb"})).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }
}
