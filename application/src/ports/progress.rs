//! Progress notification port
//!
//! Defines the callbacks the conversation loop emits while a turn runs.
//! Implementations live in the presentation layer.

use toolhost_domain::{ToolCallRequest, TurnState};

/// Callback for progress updates during a conversation turn
///
/// Every method has a no-op default so that implementations only override
/// what they display.
pub trait HostProgressNotifier: Send + Sync {
    /// Called on every state transition of the loop
    fn on_state_change(&self, _state: TurnState) {}

    /// Called before the model is asked for the next assistant turn
    fn on_inference_start(&self, _round: usize) {}

    /// Called after the assistant turn arrived
    fn on_inference_complete(&self, _round: usize, _tool_calls: usize) {}

    /// Called before a tool call is dispatched
    fn on_tool_start(&self, _call: &ToolCallRequest) {}

    /// Called after a tool call finished; `success` is false when the
    /// result describes an error
    fn on_tool_complete(&self, _call: &ToolCallRequest, _success: bool, _preview: &str) {}

    /// Called when the model asked the user for more input
    fn on_input_required(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl HostProgressNotifier for NoProgress {}
