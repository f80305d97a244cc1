//! Binding coordination between documents, generators and the rendered
//! outline
//!
//! [`OutlineEngine`] tracks one (document, generator) pair at a time. It
//! owns the activity monitor scoped to that pair, reacts to document
//! disposal, and recomputes the outline on bind, unbind, settle and
//! explicit refresh. Extraction itself is delegated to the bound
//! [`OutlineGenerator`]; rendering is delegated to the host's
//! [`OutlineSink`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::active::ActiveEntryTracker;
use crate::config::EngineConfig;
use crate::documents::{DocumentHandle, DocumentRegistry};
use crate::generators::OutlineGenerator;
use crate::heading::Heading;
use crate::locale::{IdentityBundle, LanguageBundle};
use crate::monitor::{ActivityMonitor, DEFAULT_SETTLE_TIMEOUT};
use crate::render::{MathTypesetter, OutlineModel, OutlineSink, Toolbar, default_item_renderer};

/// Localization key for the title shown when no document name is known.
const PLACEHOLDER_TITLE: &str = "Table of Contents";

/// The registry could not resolve a context for the document being bound.
///
/// Fatal to that bind call: no monitor is created and the error is
/// returned to the caller. The binding itself stays stored, so accessors
/// report it; rebinding or unbinding proceeds normally from there.
#[derive(Debug, Error)]
#[error("no document context for '{label}'")]
pub struct ContextUnresolvedError {
    /// Label of the document that failed to resolve
    pub label: String,
}

/// The (document, generator) pair the engine tracks.
#[derive(Clone)]
pub struct OutlineBinding {
    pub document: DocumentHandle,
    pub generator: Arc<dyn OutlineGenerator>,
}

impl OutlineBinding {
    pub fn new(document: DocumentHandle, generator: Arc<dyn OutlineGenerator>) -> Self {
        Self {
            document,
            generator,
        }
    }

    /// Reference identity on both halves.
    fn same(&self, other: &OutlineBinding) -> bool {
        self.document.same(&other.document) && Arc::ptr_eq(&self.generator, &other.generator)
    }
}

impl std::fmt::Debug for OutlineBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineBinding")
            .field("document", &self.document)
            .finish()
    }
}

/// Collaborators and tuning for [`OutlineEngine::with_options`].
pub struct EngineOptions {
    /// Math typesetting collaborator, for generators that produce LaTeX
    pub typesetter: Option<Arc<dyn MathTypesetter>>,
    /// Localization bundle for engine strings
    pub language: Arc<dyn LanguageBundle>,
    /// Quiet interval before a settle recomputes the outline
    pub settle_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            typesetter: None,
            language: Arc::new(IdentityBundle),
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

impl EngineOptions {
    /// Tunables from a parsed [`EngineConfig`], default collaborators.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            settle_timeout: config.throttle.settle_timeout(),
            ..Self::default()
        }
    }
}

struct BindingState {
    binding: Option<OutlineBinding>,
    monitor: Option<ActivityMonitor>,
    /// Cancels the disposal watcher attached to the current binding
    disposal_watch: Option<CancellationToken>,
    /// Toolbar resolved once at bind time
    toolbar: Option<Arc<Toolbar>>,
    /// Last successfully extracted sequence, kept across failed runs
    last_headings: Arc<Vec<Heading>>,
    /// Bumped on every accepted rebind; stale passes check against it
    generation: u64,
}

struct EngineInner {
    registry: Arc<dyn DocumentRegistry>,
    sink: Arc<dyn OutlineSink>,
    typesetter: Option<Arc<dyn MathTypesetter>>,
    language: Arc<dyn LanguageBundle>,
    settle_timeout: Duration,
    active: Arc<ActiveEntryTracker>,
    state: Mutex<BindingState>,
    /// Serializes recompute-and-render passes
    render_gate: tokio::sync::Mutex<()>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut()
            && let Some(watch) = state.disposal_watch.take()
        {
            watch.cancel();
        }
    }
}

/// Tracks the current document and keeps its outline rendered.
#[derive(Clone)]
pub struct OutlineEngine {
    inner: Arc<EngineInner>,
}

impl OutlineEngine {
    pub fn new(registry: Arc<dyn DocumentRegistry>, sink: Arc<dyn OutlineSink>) -> Self {
        Self::with_options(registry, sink, EngineOptions::default())
    }

    pub fn with_options(
        registry: Arc<dyn DocumentRegistry>,
        sink: Arc<dyn OutlineSink>,
        options: EngineOptions,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry,
                sink,
                typesetter: options.typesetter,
                language: options.language,
                settle_timeout: options.settle_timeout,
                active: Arc::new(ActiveEntryTracker::new()),
                state: Mutex::new(BindingState {
                    binding: None,
                    monitor: None,
                    disposal_watch: None,
                    toolbar: None,
                    last_headings: Arc::new(Vec::new()),
                    generation: 0,
                }),
                render_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Replace the tracked (document, generator) pair.
    ///
    /// Setting the pair already tracked (including `None` over `None`) is a
    /// no-op: nothing is torn down, nothing recomputes. Otherwise the old
    /// binding's listeners are detached before anything new is attached,
    /// and an immediate recomputation runs before this call returns.
    pub async fn set_current(
        &self,
        binding: Option<OutlineBinding>,
    ) -> Result<(), ContextUnresolvedError> {
        let watch = CancellationToken::new();
        let generation = {
            let mut state = self.inner.state.lock().unwrap();

            let unchanged = match (&state.binding, &binding) {
                (None, None) => true,
                (Some(old), Some(new)) => old.same(new),
                _ => false,
            };
            if unchanged {
                return Ok(());
            }

            // Old listeners go before anything new is attached.
            if let Some(watch) = state.disposal_watch.take() {
                watch.cancel();
            }
            if let Some(monitor) = state.monitor.take() {
                monitor.dispose();
            }

            state.generation = state.generation.wrapping_add(1);
            state.binding = binding.clone();
            state.last_headings = Arc::new(Vec::new());

            match &binding {
                None => state.toolbar = None,
                Some(binding) => {
                    state.disposal_watch = Some(watch.clone());
                    state.toolbar = binding.generator.toolbar().map(Arc::new);
                }
            }
            state.generation
        };

        let Some(binding) = binding else {
            tracing::debug!("outline binding cleared");
            self.render_outline(generation).await;
            return Ok(());
        };

        tracing::debug!("outline bound to '{}'", binding.document.label());

        // A disposed document unbinds itself; the watch token detaches this
        // listener when the binding is replaced first.
        let disposed = binding.document.disposal_token();
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = watch.cancelled() => {}
                _ = disposed.cancelled() => {
                    if let Some(inner) = weak.upgrade() {
                        tracing::debug!("bound document disposed, clearing binding");
                        let engine = OutlineEngine { inner };
                        engine.clear_current(generation).await;
                    }
                }
            }
        });

        // Resolve outside the state lock; registries are host code.
        let Some(context) = self.inner.registry.resolve(&binding.document) else {
            tracing::warn!("no context for '{}', bind aborted", binding.document.label());
            return Err(ContextUnresolvedError {
                label: binding.document.label().to_string(),
            });
        };

        let weak = Arc::downgrade(&self.inner);
        let monitor = ActivityMonitor::new(
            context.changes.subscribe(),
            self.inner.settle_timeout,
            move || {
                let weak = weak.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        let engine = OutlineEngine { inner };
                        engine.render_outline(generation).await;
                    }
                }
            },
        );
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.generation == generation {
                state.monitor = Some(monitor);
            } else {
                // A rival bind advanced the engine while we resolved.
                drop(state);
                monitor.dispose();
                return Ok(());
            }
        }

        self.render_outline(generation).await;
        Ok(())
    }

    /// Unthrottled recomputation, for moments like the outline becoming
    /// visible again.
    pub async fn refresh(&self) {
        let generation = self.inner.state.lock().unwrap().generation;
        self.render_outline(generation).await;
    }

    /// The tracked pair, if any.
    pub fn current(&self) -> Option<OutlineBinding> {
        self.inner.state.lock().unwrap().binding.clone()
    }

    /// Generator half of the tracked pair, if any.
    pub fn generator(&self) -> Option<Arc<dyn OutlineGenerator>> {
        self.inner
            .state
            .lock()
            .unwrap()
            .binding
            .as_ref()
            .map(|binding| Arc::clone(&binding.generator))
    }

    /// Inbox for activation events from the rendered outline.
    pub fn active_entry(&self) -> Arc<ActiveEntryTracker> {
        Arc::clone(&self.inner.active)
    }

    /// Drop the binding installed at `expected` and render the empty
    /// outline.
    ///
    /// The disposal watcher's exit path. The generation check under the
    /// state lock makes a watcher that fires while a rebind is replacing
    /// it a no-op, so a stale disposal never clears the successor binding.
    async fn clear_current(&self, expected: u64) {
        let generation = {
            let mut state = self.inner.state.lock().unwrap();
            if state.generation != expected {
                tracing::debug!("stale disposal ignored");
                return;
            }
            if let Some(watch) = state.disposal_watch.take() {
                watch.cancel();
            }
            if let Some(monitor) = state.monitor.take() {
                monitor.dispose();
            }
            state.generation = state.generation.wrapping_add(1);
            state.binding = None;
            state.last_headings = Arc::new(Vec::new());
            state.toolbar = None;
            state.generation
        };
        self.render_outline(generation).await;
    }

    /// Recompute and render the outline for `generation`, dropping the
    /// pass if the binding has moved on since.
    async fn render_outline(&self, generation: u64) {
        // One pass at a time; a settle pass queues behind an in-flight
        // bind pass instead of racing its render.
        let _gate = self.inner.render_gate.lock().await;

        let binding = {
            let state = self.inner.state.lock().unwrap();
            if state.generation != generation {
                tracing::debug!("skipping stale outline pass");
                return;
            }
            state.binding.clone()
        };
        let uses_latex = binding
            .as_ref()
            .is_some_and(|binding| binding.generator.uses_latex());

        let model = match binding {
            None => OutlineModel {
                title: self.inner.language.text(PLACEHOLDER_TITLE),
                headings: Arc::new(Vec::new()),
                active: Arc::clone(&self.inner.active),
                renderer: default_item_renderer(),
                toolbar: None,
            },
            Some(binding) => {
                // Extraction, title resolution and the renderer hook run
                // outside the state lock; all three call host code.
                let options = binding.generator.options();
                let outcome = binding.generator.generate(&binding.document, &options);
                let renderer = binding
                    .generator
                    .item_renderer()
                    .unwrap_or_else(default_item_renderer);
                let title = self
                    .inner
                    .registry
                    .resolve(&binding.document)
                    .and_then(|context| context.path)
                    .map(|path| basename(&path).to_string())
                    .unwrap_or_else(|| self.inner.language.text(PLACEHOLDER_TITLE));

                let mut state = self.inner.state.lock().unwrap();
                if state.generation != generation {
                    tracing::debug!("skipping stale outline pass");
                    return;
                }
                match outcome {
                    Ok(headings) => {
                        tracing::debug!(
                            "extracted {} outline entries from '{}'",
                            headings.len(),
                            binding.document.label()
                        );
                        state.last_headings = Arc::new(headings);
                    }
                    Err(error) => {
                        // Keep the previous outline on screen; the monitor
                        // stays armed so a later settle recovers.
                        tracing::warn!(
                            "outline extraction failed for '{}': {:#}",
                            binding.document.label(),
                            error
                        );
                    }
                }
                OutlineModel {
                    title,
                    headings: Arc::clone(&state.last_headings),
                    active: Arc::clone(&self.inner.active),
                    renderer,
                    toolbar: state.toolbar.clone(),
                }
            }
        };

        self.inner.sink.render(model).await;

        // Math pass strictly after the render has completed.
        if uses_latex && let Some(typesetter) = &self.inner.typesetter {
            typesetter.typeset().await;
        }
    }
}

/// Last component of a display path.
fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
