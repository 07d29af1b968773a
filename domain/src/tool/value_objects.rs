//! Tool result value objects

use super::content::ToolContent;
use crate::conversation::ContentBlock;
use serde::{Deserialize, Serialize};

/// Result of one tool invocation
///
/// `is_error` is set when the host itself produced the result to describe a
/// failure (unknown tool, backend-reported error) so the model can react.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn new(content: Vec<ToolContent>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ToolContent::text(text)])
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(message)],
            is_error: true,
        }
    }

    /// Render the result into the content blocks of a `tool` message.
    pub fn render_blocks(&self) -> Vec<ContentBlock> {
        let blocks: Vec<ContentBlock> = self.content.iter().map(render_content).collect();
        if blocks.is_empty() {
            // Chat APIs reject tool messages without content
            return vec![ContentBlock::text("")];
        }
        blocks
    }

    /// Text-only rendering, used for logs and previews
    pub fn render_text(&self) -> String {
        self.content
            .iter()
            .map(|content| match render_content(content) {
                ContentBlock::Text { text } => text,
                ContentBlock::ImageUrl { .. } => "[image]".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_content(content: &ToolContent) -> ContentBlock {
    match content {
        ToolContent::Text { text } => ContentBlock::text(text.clone()),
        ToolContent::Image { data, mime_type } => {
            ContentBlock::image_url(format!("data:{};base64,{}", mime_type, data))
        }
        ToolContent::Resource { resource } => match &resource.text {
            Some(text) => ContentBlock::text(text.clone()),
            None => ContentBlock::text(format!(
                "[resource {} ({})]",
                resource.uri,
                resource
                    .mime_type
                    .as_deref()
                    .unwrap_or("application/octet-stream")
            )),
        },
        ToolContent::Unsupported => ContentBlock::text("[unsupported content]"),
    }
}
