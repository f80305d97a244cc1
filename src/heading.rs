//! Outline entry data model
//!
//! A heading is one entry in a document outline: display text, nesting
//! level, an activation callback and an open-ended bag of format-specific
//! extras. Entries are immutable once produced; regeneration replaces the
//! whole sequence rather than mutating entries in place.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cloneable no-argument callback attached to a heading.
///
/// Invoked when the user activates the entry in the rendered outline
/// (e.g. to scroll the source view). The default is a no-op.
#[derive(Clone)]
pub struct Activation(Arc<dyn Fn() + Send + Sync>);

impl Activation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Callback that does nothing when invoked.
    pub fn noop() -> Self {
        Self(Arc::new(|| {}))
    }

    pub fn invoke(&self) {
        (self.0)()
    }
}

impl Default for Activation {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Activation")
    }
}

/// One outline entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    /// Display text, already stripped of markup
    pub text: String,
    /// Nesting level; 1 is a top-level section, 0 only the placeholder
    pub level: u8,
    /// Activation callback; not part of equality
    #[serde(skip)]
    pub on_activate: Activation,
    /// Format-specific extras (anchor slugs, source lines, numbering)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extras: serde_json::Map<String, Value>,
}

impl Heading {
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level,
            on_activate: Activation::noop(),
            extras: serde_json::Map::new(),
        }
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.on_activate = activation;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Invoke the activation callback.
    pub fn activate(&self) {
        self.on_activate.invoke()
    }

    /// Neutral entry shown before any activation has happened.
    pub fn placeholder() -> Self {
        Self::new("", 0)
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Equality covers the rendered content only, never the callback.
impl PartialEq for Heading {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.level == other.level && self.extras == other.extras
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_placeholder_is_default() {
        let heading = Heading::default();
        assert_eq!(heading, Heading::placeholder());
        assert_eq!(heading.text, "");
        assert_eq!(heading.level, 0);
        assert!(heading.extras.is_empty());
    }

    #[test]
    fn test_activation_fires() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let heading = Heading::new("Intro", 1)
            .with_activation(Activation::new(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            }));

        heading.activate();
        heading.activate();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_equality_ignores_activation() {
        let plain = Heading::new("Setup", 2);
        let wired = Heading::new("Setup", 2).with_activation(Activation::new(|| {}));
        assert_eq!(plain, wired);

        let other_level = Heading::new("Setup", 3);
        assert_ne!(plain, other_level);
    }

    #[test]
    fn test_extras_participate_in_equality() {
        let a = Heading::new("Usage", 1).with_extra("slug", Value::from("usage"));
        let b = Heading::new("Usage", 1).with_extra("slug", Value::from("usage"));
        let c = Heading::new("Usage", 1).with_extra("slug", Value::from("usage-1"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_serialize_skips_callback() {
        let heading = Heading::new("API", 1).with_extra("line", Value::from(12));
        let json = serde_json::to_value(&heading).unwrap();
        assert_eq!(json["text"], "API");
        assert_eq!(json["level"], 1);
        assert_eq!(json["extras"]["line"], 12);
        assert!(json.get("on_activate").is_none());
    }
}
