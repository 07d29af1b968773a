//! Lookup table keyed by [`ResourceKey`]

use super::{CatalogError, ResourceKey};
use std::collections::BTreeMap;

/// Immutable lookup table from resource keys to values
///
/// Built once, then only queried. Later entries with an equal key replace
/// earlier ones.
#[derive(Debug, Clone)]
pub struct ResourceCatalog<T> {
    entries: BTreeMap<ResourceKey, T>,
}

impl<T> Default for ResourceCatalog<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> ResourceCatalog<T> {
    pub fn resolve(&self, key: &ResourceKey) -> Result<&T, CatalogError> {
        self.entries
            .get(key)
            .ok_or_else(|| CatalogError::NotFound(key.clone()))
    }
}

impl<T> FromIterator<(ResourceKey, T)> for ResourceCatalog<T> {
    fn from_iter<I: IntoIterator<Item = (ResourceKey, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ResourceCatalog<&'static str> {
        vec![
            (
                ResourceKey::new("markdown", "acme/component", "Button"),
                "button.md",
            ),
            (
                ResourceKey::new("markdown", "acme/component", "TextBox"),
                "textbox.md",
            ),
            (
                ResourceKey::new("filepath", "acme/component", "Button"),
                "Button.tsx",
            ),
        ]
        .into_iter()
        .collect()
    }

    fn key(uri: &str) -> ResourceKey {
        ResourceKey::parse(uri).unwrap()
    }

    #[test]
    fn test_resolve_by_parsed_uri() {
        let catalog = catalog();
        assert_eq!(
            catalog.resolve(&key("markdown://acme/component/Button")),
            Ok(&"button.md")
        );
        assert_eq!(
            catalog.resolve(&key("filepath://acme/component/Button")),
            Ok(&"Button.tsx")
        );
    }

    #[test]
    fn test_not_found_is_explicit() {
        let catalog = catalog();
        let err = catalog
            .resolve(&key("markdown://acme/component/Slider"))
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::NotFound(ResourceKey::new("markdown", "acme/component", "Slider"))
        );
    }

    #[test]
    fn test_later_entries_replace_earlier() {
        let key = ResourceKey::new("notes", "", "todo");
        let catalog: ResourceCatalog<u8> = vec![(key.clone(), 1), (key.clone(), 2)]
            .into_iter()
            .collect();
        assert_eq!(catalog.resolve(&key), Ok(&2));
    }
}
