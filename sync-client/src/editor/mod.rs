//! Editor abstraction for monto-sync.
//!
//! The synchronizer never talks to a concrete editor. It needs three
//! capabilities:
//! - `open()` opens or focuses a document and returns a stable handle
//! - `selections()` reads the current selections of a view
//! - `set_selections()` replaces a view's selections and reveals the first
//!
//! Selection-change events travel the other way, posted by the editor
//! integration through a [`SessionHandle`](crate::SessionHandle).

mod mock;

pub use mock::{AppliedSelection, MockEditor};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use monto_sync_core::TextRange;

/// Editor errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The document could not be opened.
    #[error("failed to open {uri}: {reason}")]
    OpenFailed {
        /// Document that failed to open.
        uri: String,
        /// Editor-supplied reason.
        reason: String,
    },

    /// The handle does not refer to a live view.
    #[error("unknown view: {0:?}")]
    UnknownView(ViewHandle),

    /// The editor is shutting down.
    #[error("editor closed")]
    Closed,
}

/// Editor-assigned identifier of an open view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(u64);

impl ViewHandle {
    /// Create a handle with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this handle.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Where and how a document should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPlacement {
    /// Editor column (1-based).
    pub column: u8,
    /// Keep focus on the currently active view.
    pub preserve_focus: bool,
}

/// How to scroll a view after its selections were replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reveal {
    /// Center the first selection unless it is already visible.
    #[default]
    CenterIfOutside,
    /// Scroll as little as possible.
    Minimal,
    /// Do not scroll.
    None,
}

/// Editor capabilities the synchronizer consumes.
#[async_trait]
pub trait Editor: Send + Sync + 'static {
    /// Open (or focus) `uri` and return its view handle.
    ///
    /// Must be idempotent: opening an already open document returns the same
    /// handle.
    async fn open(&self, uri: &Url, placement: ViewPlacement) -> Result<ViewHandle, EditorError>;

    /// Current selections of `view`.
    fn selections(&self, view: ViewHandle) -> Result<Vec<TextRange>, EditorError>;

    /// Replace the selections of `view` and scroll the first into view.
    fn set_selections(
        &self,
        view: ViewHandle,
        selections: &[TextRange],
        reveal: Reveal,
    ) -> Result<(), EditorError>;
}
