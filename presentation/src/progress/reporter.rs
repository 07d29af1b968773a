//! Progress reporting for conversation turns

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use toolhost_application::HostProgressNotifier;
use toolhost_domain::ToolCallRequest;

/// Reports progress with a spinner that follows the turn
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start(&self, prefix: &str, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(prefix.to_string());
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.spinner.lock()
            && let Some(previous) = slot.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    /// Stop the spinner and leave `line` in its place
    fn finish(&self, line: String) {
        if let Ok(mut slot) = self.spinner.lock() {
            match slot.take() {
                Some(pb) => pb.finish_with_message(line),
                None => println!("{}", line),
            }
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.clear();
    }
}

impl HostProgressNotifier for ProgressReporter {
    fn on_inference_start(&self, round: usize) {
        let message = if round <= 1 {
            "Thinking...".to_string()
        } else {
            format!("Thinking (round {})...", round)
        };
        self.start("model", message);
    }

    fn on_inference_complete(&self, _round: usize, tool_calls: usize) {
        if tool_calls == 0 {
            self.clear();
        } else {
            self.finish(format!("{} requested {} tool call(s)", "->".cyan(), tool_calls));
        }
    }

    fn on_tool_start(&self, call: &ToolCallRequest) {
        self.start("tool", format!("{} {}", call.name, call.arguments));
    }

    fn on_tool_complete(&self, call: &ToolCallRequest, success: bool, preview: &str) {
        let mark = if success { "v".green() } else { "x".red() };
        self.finish(format!("  {} {} {}", mark, call.name.bold(), preview.dimmed()));
    }

    fn on_input_required(&self) {
        self.clear();
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl HostProgressNotifier for SimpleProgress {
    fn on_inference_start(&self, round: usize) {
        println!("{} {} (round {})", "->".cyan(), "Inference".bold(), round);
    }

    fn on_tool_start(&self, call: &ToolCallRequest) {
        println!("{} {} {}", "->".cyan(), call.name.bold(), call.arguments);
    }

    fn on_tool_complete(&self, call: &ToolCallRequest, success: bool, preview: &str) {
        if success {
            println!("  {} {} {}", "v".green(), call.name, preview);
        } else {
            println!("  {} {} (failed) {}", "x".red(), call.name, preview);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reporter_survives_a_full_turn() {
        let reporter = ProgressReporter::new();
        let call = ToolCallRequest::new("c1", "listComponents", json!({}));

        reporter.on_inference_start(1);
        reporter.on_inference_complete(1, 1);
        reporter.on_tool_start(&call);
        reporter.on_tool_complete(&call, true, "button, card");
        reporter.on_inference_start(2);
        reporter.on_inference_complete(2, 0);

        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_new_spinner_replaces_running_one() {
        let reporter = ProgressReporter::new();
        reporter.on_inference_start(1);
        reporter.on_tool_start(&ToolCallRequest::new("c1", "readFile", json!({"path": "a"})));
        assert!(reporter.spinner.lock().unwrap().is_some());
        reporter.on_input_required();
        assert!(reporter.spinner.lock().unwrap().is_none());
    }
}
