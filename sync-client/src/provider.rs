//! Virtual document provider.
//!
//! Exposes stored product content as read-only document text for the
//! product scheme, and broadcasts a [`ContentChange`] after every save so
//! open views re-read their content. There are no write operations: product
//! documents are never authoritative.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use monto_sync_core::{ChangeListener, ProductStore};
use monto_sync_types::{Generation, TargetUri};

/// The product store shared between the provider, the protocol handler and
/// the synchronizer.
pub type SharedStore = Arc<Mutex<ProductStore>>;

/// Lock the shared store.
///
/// A panic while holding the lock cannot leave a half-saved product behind
/// (the map insert is the last mutation), so poisoning is ignored.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ProductStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Signal that a product document's content was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// The product document.
    pub uri: TargetUri,
    /// Generation of the new content.
    pub generation: Generation,
}

struct BroadcastListener(broadcast::Sender<ContentChange>);

impl ChangeListener for BroadcastListener {
    fn content_changed(&self, uri: &TargetUri, generation: Generation) {
        // No subscribers is fine: nothing is displaying products yet.
        let _ = self.0.send(ContentChange {
            uri: uri.clone(),
            generation,
        });
    }
}

/// Read-only content source for product documents.
#[derive(Clone)]
pub struct VirtualDocumentProvider {
    store: SharedStore,
    changes: broadcast::Sender<ContentChange>,
    unknown_content: Arc<str>,
}

impl VirtualDocumentProvider {
    /// Create a provider over `store` and register it for change signals.
    ///
    /// `unknown_content` is served for identifiers that were never published.
    pub fn new(store: SharedStore, unknown_content: &str, capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        lock_store(&store).subscribe(Box::new(BroadcastListener(changes.clone())));
        Self {
            store,
            changes,
            unknown_content: Arc::from(unknown_content),
        }
    }

    /// Current text of `uri`.
    pub fn content(&self, uri: &TargetUri) -> String {
        lock_store(&self.store)
            .content(uri)
            .map(str::to_owned)
            .unwrap_or_else(|| self.unknown_content.to_string())
    }

    /// Subscribe to content changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentChange> {
        self.changes.subscribe()
    }

    /// The scheme this provider serves.
    pub fn scheme(&self) -> String {
        lock_store(&self.store).codec().scheme().to_string()
    }
}

impl std::fmt::Debug for VirtualDocumentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDocumentProvider")
            .field("unknown_content", &self.unknown_content)
            .field("subscribers", &self.changes.receiver_count())
            .finish()
    }
}
