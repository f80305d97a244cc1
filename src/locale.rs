//! Host-facing localization boundary
//!
//! The engine produces a handful of user-visible strings (outline titles,
//! placeholders). Hosts that localize pass a bundle; everyone else gets the
//! identity bundle, which returns each key unchanged.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Translates engine strings for display.
pub trait LanguageBundle: Send + Sync {
    /// Translation for `key`, or the key itself when no entry exists.
    fn text(&self, key: &str) -> String;
}

/// Default bundle: every key translates to itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityBundle;

impl LanguageBundle for IdentityBundle {
    fn text(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Table-backed bundle, loadable from a plain JSON object.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableBundle {
    entries: HashMap<String, String>,
}

impl TableBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl LanguageBundle for TableBundle {
    fn text(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(value) => value.clone(),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_returns_key() {
        let bundle = IdentityBundle;
        assert_eq!(bundle.text("Table of Contents"), "Table of Contents");
    }

    #[test]
    fn test_table_lookup_and_fallback() {
        let bundle = TableBundle::new().with_entry("Table of Contents", "Inhaltsverzeichnis");
        assert_eq!(bundle.text("Table of Contents"), "Inhaltsverzeichnis");
        assert_eq!(bundle.text("Untitled"), "Untitled");
    }

    #[test]
    fn test_table_deserializes_from_json_object() {
        let bundle: TableBundle =
            serde_json::from_str(r#"{"Table of Contents": "Sommaire"}"#).unwrap();
        assert_eq!(bundle.text("Table of Contents"), "Sommaire");
    }
}
