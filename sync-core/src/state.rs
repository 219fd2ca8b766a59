//! Echo-suppression state machine for monto-sync.
//!
//! Every stored product carries one [`SyncState`]. A view whose content was
//! just (re)published emits a selection-change event of its own when the
//! editor refreshes it; that first event is not a user gesture and must not
//! be propagated, or linked views would bounce selections back and forth.
//!
//! The machine is pure: it takes an event and returns the new state plus the
//! [`Action`] the synchronizer should take. Nothing here touches an editor.

/// Per-product suppression state - NO I/O, just transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// The next selection event on this product's view is an artifact of a
    /// refresh and will be absorbed.
    #[default]
    Unarmed,
    /// Selection events are user gestures and propagate.
    Armed,
}

impl SyncState {
    /// Create a new state machine in the Unarmed state.
    pub fn new() -> Self {
        Self::Unarmed
    }

    /// Process an event and return the new state plus the action to take.
    pub fn on_event(self, event: Event) -> (Self, Action) {
        match (self, event) {
            // A fresh publish replaces the view wholesale; the selection the
            // editor reports for it next is again an artifact.
            (_, Event::Republished) => (Self::Unarmed, Action::None),

            (Self::Unarmed, Event::SelectionChanged) => (Self::Armed, Action::Absorb),
            (Self::Armed, Event::SelectionChanged) => (Self::Armed, Action::Propagate),

            // An explicit sync request always propagates and pre-arms.
            (_, Event::ManualSync) => (Self::Armed, Action::Propagate),
        }
    }

    /// Check if selection events currently propagate.
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed)
    }
}

/// Events that drive the suppression state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The product was saved again by a publish.
    Republished,
    /// A view linked to this product reported a selection change.
    SelectionChanged,
    /// The user explicitly asked to push the source selection to this product.
    ManualSync,
}

/// What the synchronizer should do with the triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to propagate.
    None,
    /// Consume the event without propagating it.
    Absorb,
    /// Map the event's selections and apply them to the linked view.
    Propagate,
}
