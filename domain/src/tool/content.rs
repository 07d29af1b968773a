//! Typed content returned by tools

use crate::catalog::ResourceContents;
use serde::{Deserialize, Serialize};

/// One piece of tool output
///
/// Mirrors the content kinds a tool backend may return. Kinds the host does
/// not understand deserialize to [`ToolContent::Unsupported`] instead of
/// failing the whole result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: ResourceContents,
    },
    #[serde(other)]
    Unsupported,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }

    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ToolContent::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}
