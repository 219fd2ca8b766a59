//! Mock editor for testing.
//!
//! Records opens and selection writes, lets tests play the user by setting
//! selections directly, and can hold opens pending to exercise ordering.

use super::{Editor, EditorError, Reveal, ViewHandle, ViewPlacement};
use async_trait::async_trait;
use monto_sync_core::TextRange;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use url::Url;

/// A selection write performed through [`Editor::set_selections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSelection {
    /// Document the selections were written to.
    pub uri: Url,
    /// The selections written.
    pub selections: Vec<TextRange>,
    /// Requested scroll behavior.
    pub reveal: Reveal,
}

/// Mock editor for testing and headless replay.
#[derive(Debug, Clone)]
pub struct MockEditor {
    inner: Arc<Mutex<MockEditorInner>>,
    gate: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct MockEditorInner {
    next_handle: u64,
    views: HashMap<Url, ViewHandle>,
    documents: HashMap<ViewHandle, Url>,
    selections: HashMap<ViewHandle, Vec<TextRange>>,
    opens: Vec<(Url, ViewPlacement)>,
    applied: Vec<AppliedSelection>,
    fail_next_open: Option<String>,
}

impl MockEditor {
    /// Create a new mock editor whose opens complete immediately.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Mutex::new(MockEditorInner::default())),
            gate: Arc::new(gate),
        }
    }

    /// Make subsequent `open()` calls wait until [`release_opens`](Self::release_opens).
    pub fn hold_opens(&self) {
        self.gate.send_replace(false);
    }

    /// Let pending and future `open()` calls complete.
    pub fn release_opens(&self) {
        self.gate.send_replace(true);
    }

    /// Cause the next open() to fail with the given reason.
    pub fn fail_next_open(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_open = Some(reason.to_string());
    }

    /// Open `uri` synchronously, as if the user did it.
    pub fn open_now(&self, uri: &Url) -> ViewHandle {
        let mut inner = self.inner.lock().unwrap();
        inner.view_for(uri)
    }

    /// Play the user: replace the selections of `uri`'s view.
    ///
    /// Returns the view handle, opening the document if needed.
    pub fn select(&self, uri: &Url, selections: Vec<TextRange>) -> ViewHandle {
        let mut inner = self.inner.lock().unwrap();
        let view = inner.view_for(uri);
        inner.selections.insert(view, selections);
        view
    }

    /// Handle of `uri`'s view, if open.
    pub fn view_of(&self, uri: &Url) -> Option<ViewHandle> {
        let inner = self.inner.lock().unwrap();
        inner.views.get(uri).copied()
    }

    /// Current selections of `uri`'s view.
    pub fn selections_of(&self, uri: &Url) -> Vec<TextRange> {
        let inner = self.inner.lock().unwrap();
        inner
            .views
            .get(uri)
            .and_then(|view| inner.selections.get(view))
            .cloned()
            .unwrap_or_default()
    }

    /// Every open() that completed, in order.
    pub fn opens(&self) -> Vec<(Url, ViewPlacement)> {
        let inner = self.inner.lock().unwrap();
        inner.opens.clone()
    }

    /// Every selection write, in order.
    pub fn applied(&self) -> Vec<AppliedSelection> {
        let inner = self.inner.lock().unwrap();
        inner.applied.clone()
    }

    /// The most recent selection write.
    pub fn last_applied(&self) -> Option<AppliedSelection> {
        let inner = self.inner.lock().unwrap();
        inner.applied.last().cloned()
    }
}

impl Default for MockEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEditorInner {
    fn view_for(&mut self, uri: &Url) -> ViewHandle {
        if let Some(view) = self.views.get(uri) {
            return *view;
        }
        self.next_handle += 1;
        let view = ViewHandle::new(self.next_handle);
        self.views.insert(uri.clone(), view);
        self.documents.insert(view, uri.clone());
        self.selections.insert(view, vec![TextRange::caret(0)]);
        view
    }
}

#[async_trait]
impl Editor for MockEditor {
    async fn open(&self, uri: &Url, placement: ViewPlacement) -> Result<ViewHandle, EditorError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(reason) = inner.fail_next_open.take() {
                return Err(EditorError::OpenFailed {
                    uri: uri.to_string(),
                    reason,
                });
            }
        }

        let mut released = self.gate.subscribe();
        released
            .wait_for(|open| *open)
            .await
            .map_err(|_| EditorError::Closed)?;

        let mut inner = self.inner.lock().unwrap();
        let view = inner.view_for(uri);
        inner.opens.push((uri.clone(), placement));
        Ok(view)
    }

    fn selections(&self, view: ViewHandle) -> Result<Vec<TextRange>, EditorError> {
        let inner = self.inner.lock().unwrap();
        inner
            .selections
            .get(&view)
            .cloned()
            .ok_or(EditorError::UnknownView(view))
    }

    fn set_selections(
        &self,
        view: ViewHandle,
        selections: &[TextRange],
        reveal: Reveal,
    ) -> Result<(), EditorError> {
        let mut inner = self.inner.lock().unwrap();
        let uri = inner
            .documents
            .get(&view)
            .cloned()
            .ok_or(EditorError::UnknownView(view))?;
        inner.selections.insert(view, selections.to_vec());
        inner.applied.push(AppliedSelection {
            uri,
            selections: selections.to_vec(),
            reveal,
        });
        Ok(())
    }
}
