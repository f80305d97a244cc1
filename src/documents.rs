//! Document handles and the document-management boundary
//!
//! The engine never owns documents. It holds cheap-clone handles issued by
//! the host and asks a [`DocumentRegistry`] to resolve each handle into a
//! change-notification source and a display path. [`Workspace`] is the
//! in-memory registry used by the CLI and tests; embedding hosts with a real
//! document manager implement [`DocumentRegistry`] themselves.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Buffered change notifications per document. A lagged receiver still
/// proves activity happened, which is all the throttle needs.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Payload convention for text documents: generators downcast to this.
pub type TextBuffer = RwLock<String>;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

struct DocumentShared {
    id: u64,
    label: String,
    disposed: CancellationToken,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

/// Cheap-clone reference to a host document.
///
/// Carries a label, a terminal disposal signal and an opaque payload that
/// only generator implementations interpret. Two handles are "the same
/// document" only when they share the underlying allocation.
#[derive(Clone)]
pub struct DocumentHandle {
    shared: Arc<DocumentShared>,
}

impl DocumentHandle {
    pub fn new(label: impl Into<String>) -> Self {
        Self::build(label.into(), None)
    }

    /// Handle carrying a payload for generators to downcast.
    pub fn with_payload<P>(label: impl Into<String>, payload: Arc<P>) -> Self
    where
        P: Any + Send + Sync,
    {
        Self::build(label.into(), Some(payload as Arc<dyn Any + Send + Sync>))
    }

    fn build(label: String, payload: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        Self {
            shared: Arc::new(DocumentShared {
                id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
                label,
                disposed: CancellationToken::new(),
                payload,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Downcast the opaque payload.
    pub fn payload<P>(&self) -> Option<Arc<P>>
    where
        P: Any + Send + Sync,
    {
        let payload = self.shared.payload.as_ref()?;
        Arc::clone(payload).downcast::<P>().ok()
    }

    /// Mark the document disposed. Terminal and idempotent.
    pub fn dispose(&self) {
        self.shared.disposed.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.is_cancelled()
    }

    /// Token that resolves once the document is disposed.
    pub fn disposal_token(&self) -> CancellationToken {
        self.shared.disposed.clone()
    }

    /// Reference identity, the binding-equality notion.
    pub fn same(&self, other: &DocumentHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("id", &self.shared.id)
            .field("label", &self.shared.label)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// What a registry resolves a handle into.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    /// Change-notification source; subscribe for edit activity.
    pub changes: broadcast::Sender<()>,
    /// Display path, if the document has one.
    pub path: Option<String>,
}

/// Document-management boundary.
pub trait DocumentRegistry: Send + Sync {
    /// Resolve a handle into its live context. `None` means the registry
    /// does not know the document; binding to it fails.
    fn resolve(&self, document: &DocumentHandle) -> Option<DocumentContext>;
}

struct WorkspaceEntry {
    changes: broadcast::Sender<()>,
    path: Option<String>,
    text: Arc<TextBuffer>,
}

/// In-memory document store implementing [`DocumentRegistry`].
#[derive(Default)]
pub struct Workspace {
    entries: DashMap<u64, WorkspaceEntry>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a text document. The returned handle carries the shared text
    /// buffer as its payload.
    pub fn open(&self, path: impl Into<String>, text: impl Into<String>) -> DocumentHandle {
        let path = path.into();
        let buffer = Arc::new(RwLock::new(text.into()));
        let handle = DocumentHandle::with_payload(path.clone(), Arc::clone(&buffer));
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        self.entries.insert(
            handle.id(),
            WorkspaceEntry {
                changes,
                path: Some(path),
                text: buffer,
            },
        );
        handle
    }

    /// Replace the document text and broadcast a change notification.
    pub fn update(&self, document: &DocumentHandle, text: impl Into<String>) {
        if let Some(entry) = self.entries.get(&document.id()) {
            *entry.text.write().unwrap() = text.into();
            let _ = entry.changes.send(());
        }
    }

    /// Broadcast a change notification without touching the text.
    pub fn touch(&self, document: &DocumentHandle) {
        if let Some(entry) = self.entries.get(&document.id()) {
            let _ = entry.changes.send(());
        }
    }

    /// Snapshot of the current text.
    pub fn text(&self, document: &DocumentHandle) -> Option<String> {
        self.entries
            .get(&document.id())
            .map(|entry| entry.text.read().unwrap().clone())
    }

    /// Drop the document and fire its disposal signal.
    pub fn close(&self, document: &DocumentHandle) {
        self.entries.remove(&document.id());
        document.dispose();
    }
}

impl DocumentRegistry for Workspace {
    fn resolve(&self, document: &DocumentHandle) -> Option<DocumentContext> {
        self.entries.get(&document.id()).map(|entry| DocumentContext {
            changes: entry.changes.clone(),
            path: entry.path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_is_reference_identity() {
        let a = DocumentHandle::new("notes.md");
        let b = DocumentHandle::new("notes.md");
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn test_dispose_is_terminal() {
        let doc = DocumentHandle::new("draft.md");
        assert!(!doc.is_disposed());
        doc.dispose();
        doc.dispose();
        assert!(doc.is_disposed());
    }

    #[test]
    fn test_payload_downcast() {
        let doc = DocumentHandle::with_payload("buf", Arc::new(RwLock::new(String::from("x"))));
        let buffer = doc.payload::<TextBuffer>().unwrap();
        assert_eq!(*buffer.read().unwrap(), "x");
        assert!(doc.payload::<u32>().is_none());

        let bare = DocumentHandle::new("no-payload");
        assert!(bare.payload::<TextBuffer>().is_none());
    }

    #[test]
    fn test_workspace_resolve_and_text() {
        let workspace = Workspace::new();
        let doc = workspace.open("docs/guide.md", "# Guide\n");

        let context = workspace.resolve(&doc).unwrap();
        assert_eq!(context.path.as_deref(), Some("docs/guide.md"));
        assert_eq!(workspace.text(&doc).as_deref(), Some("# Guide\n"));

        let stranger = DocumentHandle::new("elsewhere.md");
        assert!(workspace.resolve(&stranger).is_none());
    }

    #[tokio::test]
    async fn test_workspace_update_broadcasts() {
        let workspace = Workspace::new();
        let doc = workspace.open("a.md", "");
        let mut changes = workspace.resolve(&doc).unwrap().changes.subscribe();

        workspace.update(&doc, "# One\n");
        workspace.touch(&doc);

        changes.recv().await.unwrap();
        changes.recv().await.unwrap();
        assert_eq!(workspace.text(&doc).as_deref(), Some("# One\n"));
    }

    #[test]
    fn test_close_disposes_and_unresolves() {
        let workspace = Workspace::new();
        let doc = workspace.open("gone.md", "");
        workspace.close(&doc);
        assert!(doc.is_disposed());
        assert!(workspace.resolve(&doc).is_none());
        assert!(workspace.text(&doc).is_none());
    }
}
