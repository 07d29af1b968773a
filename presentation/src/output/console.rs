//! Console output formatter for conversation turns and host state

use colored::Colorize;
use toolhost_application::{RegisteredResource, RunConversationOutput, TurnOutcome};
use toolhost_domain::{Message, ResourceContents, Role};

/// Formats replies, tool listings and transcripts for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the assistant reply of a finished turn
    pub fn format_reply(output: &RunConversationOutput) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", "assistant>".green().bold(), output.reply));

        if output.outcome == TurnOutcome::InputRequired {
            out.push_str(&format!("{}\n", "(the assistant is waiting for your input)".yellow()));
        }
        if output.rounds > 0 {
            out.push_str(&format!(
                "{}\n",
                format!("{} tool round(s), {} messages", output.rounds, output.message_count)
                    .dimmed()
            ));
        }
        out
    }

    /// Tool to backend table, in catalog order
    pub fn format_tools(routes: &[(&str, &str)]) -> String {
        if routes.is_empty() {
            return format!("{}\n", "No tools available.".dimmed());
        }
        let width = routes.iter().map(|(tool, _)| tool.len()).max().unwrap_or(0);
        let mut out = format!("{}\n", Self::section_header(&format!("Tools ({})", routes.len())));
        for (tool, backend) in routes {
            out.push_str(&format!("  {:width$}  {}\n", tool.cyan(), backend.dimmed(), width = width));
        }
        out
    }

    pub fn format_servers(names: &[&str]) -> String {
        let mut out = format!("{}\n", Self::section_header(&format!("Servers ({})", names.len())));
        for name in names {
            out.push_str(&format!("  - {}\n", name));
        }
        out
    }

    pub fn format_resources(resources: &[RegisteredResource]) -> String {
        if resources.is_empty() {
            return format!("{}\n", "No resources available.".dimmed());
        }
        let mut out = format!(
            "{}\n",
            Self::section_header(&format!("Resources ({})", resources.len()))
        );
        for resource in resources {
            out.push_str(&format!(
                "  {} {}\n",
                resource.descriptor.uri.cyan(),
                format!("[{}]", resource.backend).dimmed()
            ));
            if let Some(description) = &resource.descriptor.description {
                out.push_str(&format!("      {}\n", description));
            }
        }
        out
    }

    /// Body of a read resource; binary contents are summarised
    pub fn format_resource_contents(contents: &[ResourceContents]) -> String {
        let mut out = String::new();
        for item in contents {
            match (&item.text, &item.blob) {
                (Some(text), _) => {
                    out.push_str(text);
                    out.push('\n');
                }
                (None, Some(blob)) => out.push_str(&format!(
                    "{}\n",
                    format!(
                        "[binary {} ({}), {} base64 chars]",
                        item.uri,
                        item.mime_type.as_deref().unwrap_or("application/octet-stream"),
                        blob.len()
                    )
                    .dimmed()
                )),
                (None, None) => out.push_str(&format!("{}\n", format!("[empty {}]", item.uri).dimmed())),
            }
        }
        out
    }

    /// Message count plus the last `tail` messages of a transcript
    pub fn format_history(name: &str, messages: &[Message], tail: usize) -> String {
        let mut out = format!(
            "{}\n",
            Self::section_header(&format!("Conversation '{}' ({} messages)", name, messages.len()))
        );
        let start = messages.len().saturating_sub(tail);
        for message in &messages[start..] {
            out.push_str(&format!("  {}\n", Self::message_line(message)));
        }
        out
    }

    fn message_line(message: &Message) -> String {
        let role = match message.role {
            Role::System => "system".dimmed(),
            Role::User => "user".blue().bold(),
            Role::Assistant => "assistant".green().bold(),
            Role::Tool => "tool".magenta(),
        };
        let mut body = message.text().unwrap_or_default();
        if message.has_tool_calls() {
            let names: Vec<&str> = message.tool_calls.iter().map(|c| c.name.as_str()).collect();
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(&format!("-> {}", names.join(", ")));
        }
        format!("{:>9}: {}", role, Self::truncate(&body.replace('\n', " "), 100))
    }

    fn section_header(title: &str) -> String {
        format!("{}\n{}", title.cyan().bold(), "-".repeat(40))
    }

    /// Shorten to at most `max` characters, marking the cut with `...`
    pub fn truncate(text: &str, max: usize) -> String {
        if text.chars().count() <= max {
            return text.to_string();
        }
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
