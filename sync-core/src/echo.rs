//! Echo tracking for programmatically applied selections.
//!
//! When the synchronizer writes selections into a view, the editor reports
//! that change back as an ordinary selection event. The guard remembers what
//! was written so that report can be recognized and absorbed without
//! touching the product's [`SyncState`](crate::SyncState).

use std::collections::HashMap;
use std::hash::Hash;

use crate::TextRange;

/// Remembers the last selections written to each document.
#[derive(Debug, Clone)]
pub struct EchoGuard<K> {
    pending: HashMap<K, Vec<TextRange>>,
}

impl<K: Hash + Eq> EchoGuard<K> {
    /// Create an empty guard.
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Record selections just written to `document`.
    pub fn record(&mut self, document: K, selections: Vec<TextRange>) {
        self.pending.insert(document, selections);
    }

    /// Check an incoming event against the recorded write.
    ///
    /// Returns `true` when the event is the echo of that write. Either way the
    /// record is consumed: an event that differs means the user has moved on.
    pub fn absorb(&mut self, document: &K, selections: &[TextRange]) -> bool {
        match self.pending.remove(document) {
            Some(expected) => expected == selections,
            None => false,
        }
    }

    /// Drop any record for `document`.
    pub fn forget(&mut self, document: &K) {
        self.pending.remove(document);
    }

    /// Whether a write to `document` is awaiting its echo.
    pub fn is_pending(&self, document: &K) -> bool {
        self.pending.contains_key(document)
    }
}

impl<K: Hash + Eq> Default for EchoGuard<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_event_is_absorbed_once() {
        let mut guard = EchoGuard::new();
        guard.record("a", vec![TextRange::new(0, 3)]);
        assert!(guard.is_pending(&"a"));
        assert!(guard.absorb(&"a", &[TextRange::new(0, 3)]));
        assert!(!guard.is_pending(&"a"));
        assert!(!guard.absorb(&"a", &[TextRange::new(0, 3)]));
    }

    #[test]
    fn different_event_passes_and_clears() {
        let mut guard = EchoGuard::new();
        guard.record("a", vec![TextRange::new(0, 3)]);
        assert!(!guard.absorb(&"a", &[TextRange::caret(1)]));
        assert!(!guard.is_pending(&"a"));
    }

    #[test]
    fn documents_are_independent() {
        let mut guard = EchoGuard::new();
        guard.record("a", vec![TextRange::caret(1)]);
        assert!(!guard.absorb(&"b", &[TextRange::caret(1)]));
        assert!(guard.is_pending(&"a"));
    }

    #[test]
    fn forget_drops_record() {
        let mut guard = EchoGuard::new();
        guard.record("a", vec![TextRange::caret(1)]);
        guard.forget(&"a");
        assert!(!guard.absorb(&"a", &[TextRange::caret(1)]));
    }
}
