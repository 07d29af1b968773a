//! Structured resource keys

use super::CatalogError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Structured form of a resource URI
///
/// `markdown://acme/design-system/component/Button` becomes
/// `{scheme: "markdown", category: "acme/design-system/component", name: "Button"}`.
/// The category is every path segment but the last and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub scheme: String,
    pub category: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(
        scheme: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            category: category.into(),
            name: name.into(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self, CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = uri.split_once("://").ok_or_else(|| invalid("missing '://'"))?;
        if scheme.is_empty() {
            return Err(invalid("empty scheme"));
        }

        let path = rest.trim_matches('/');
        let (category, name) = match path.rsplit_once('/') {
            Some((category, name)) => (category, name),
            None => ("", path),
        };
        if name.is_empty() {
            return Err(invalid("empty resource name"));
        }

        Ok(Self::new(scheme, category, name))
    }
}

impl FromStr for ResourceKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}://{}", self.scheme, self.name)
        } else {
            write!(f, "{}://{}/{}", self.scheme, self.category, self.name)
        }
    }
}
