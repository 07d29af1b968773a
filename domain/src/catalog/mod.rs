//! Resource catalog: URIs parsed into structured keys and resolved
//! through a lookup table built once.

pub mod key;
pub mod resource;
pub mod table;

pub use key::ResourceKey;
pub use resource::{ResourceContents, ResourceDescriptor};
pub use table::ResourceCatalog;

use thiserror::Error;

/// Resource lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid resource URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Resource not found: {0}")]
    NotFound(ResourceKey),
}
