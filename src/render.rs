//! Outline model and the rendering boundary
//!
//! The engine does not render. On every recomputation it hands an
//! [`OutlineModel`] snapshot to the host's [`OutlineSink`] and, when the
//! bound generator produces LaTeX, follows up with one [`MathTypesetter`]
//! pass strictly after the render completes.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::active::ActiveEntryTracker;
use crate::heading::{Activation, Heading};

/// Renders one entry for display. Receives the entry and the whole
/// sequence for context (ancestry, numbering).
pub type ItemRenderer = Arc<dyn Fn(&Heading, &[Heading]) -> String + Send + Sync>;

/// Renderer substituted when a generator supplies none: the heading text
/// verbatim.
pub fn default_item_renderer() -> ItemRenderer {
    Arc::new(|heading, _all| heading.text.clone())
}

/// One control a generator contributes to the outline toolbar.
#[derive(Debug, Clone)]
pub struct ToolbarControl {
    pub id: String,
    pub label: String,
    pub on_activate: Activation,
}

/// Toolbar resolved once per bind from the generator's factory.
#[derive(Debug, Clone, Default)]
pub struct Toolbar {
    pub controls: Vec<ToolbarControl>,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        on_activate: Activation,
    ) -> Self {
        self.controls.push(ToolbarControl {
            id: id.into(),
            label: label.into(),
            on_activate,
        });
        self
    }
}

/// Snapshot handed to the sink on every render.
#[derive(Clone)]
pub struct OutlineModel {
    /// Display title: document basename, or the localized placeholder
    pub title: String,
    /// Ordered outline entries
    pub headings: Arc<Vec<Heading>>,
    /// Live accessor for the active entry; shared across renders
    pub active: Arc<ActiveEntryTracker>,
    /// Entry renderer, the generator's or the default
    pub renderer: ItemRenderer,
    /// Toolbar resolved at bind time, if any
    pub toolbar: Option<Arc<Toolbar>>,
}

impl OutlineModel {
    /// Render every entry with the model's renderer.
    pub fn rendered_lines(&self) -> Vec<String> {
        self.headings
            .iter()
            .map(|heading| (self.renderer)(heading, &self.headings))
            .collect()
    }
}

impl fmt::Debug for OutlineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineModel")
            .field("title", &self.title)
            .field("headings", &self.headings.len())
            .field("toolbar", &self.toolbar.is_some())
            .finish()
    }
}

/// Where rendered outlines go.
#[async_trait]
pub trait OutlineSink: Send + Sync {
    /// Replace the displayed outline with `model`.
    async fn render(&self, model: OutlineModel);
}

/// Math typesetting collaborator. Invoked after a render completes when
/// the bound generator reports LaTeX output.
#[async_trait]
pub trait MathTypesetter: Send + Sync {
    async fn typeset(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_renderer_is_verbatim() {
        let renderer = default_item_renderer();
        let heading = Heading::new("Results", 2);
        assert_eq!(renderer(&heading, &[heading.clone()]), "Results");
    }

    #[test]
    fn test_rendered_lines_use_model_renderer() {
        let model = OutlineModel {
            title: "doc.md".to_string(),
            headings: Arc::new(vec![Heading::new("A", 1), Heading::new("B", 2)]),
            active: Arc::new(ActiveEntryTracker::new()),
            renderer: Arc::new(|h, _| format!("{}:{}", h.level, h.text)),
            toolbar: None,
        };
        assert_eq!(model.rendered_lines(), vec!["1:A", "2:B"]);
    }

    #[test]
    fn test_toolbar_builder() {
        let toolbar = Toolbar::new()
            .with_control("refresh", "Refresh", Activation::noop())
            .with_control("numbered", "Toggle numbering", Activation::noop());
        assert_eq!(toolbar.controls.len(), 2);
        assert_eq!(toolbar.controls[0].id, "refresh");
    }
}
