//! Selection synchronization between source views and product views.
//!
//! A selection change is turned into zero or more [`PendingSelection`]s:
//! mapped selections bound to the product snapshot they were computed from.
//! The session opens (or focuses) each destination view and only then hands
//! the pending selection back to [`SelectionSynchronizer::apply`], which
//! drops it if the product was republished in the meantime.
//!
//! Events on a product view map backward into its source. Events on a source
//! view map forward into every linked product view that is currently open,
//! each consulting that product's own suppression state.
//!
//! While the session is opening a document, selection events reported for it
//! come from the open itself and are absorbed.

use std::collections::{HashMap, HashSet};

use url::Url;

use monto_sync_core::{Action, Direction, EchoGuard, ProductStore, TextRange};
use monto_sync_types::{Generation, SourceUri, TargetUri};

use crate::config::SessionConfig;
use crate::editor::{Editor, EditorError, Reveal, ViewHandle, ViewPlacement};
use crate::provider::{lock_store, SharedStore};

/// Mapped selections waiting for their destination view to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    /// Document the selections are written to.
    pub document: Url,
    /// How the document is opened.
    pub placement: ViewPlacement,
    /// Product the mapping was computed from.
    pub origin: TargetUri,
    /// Generation of `origin` at mapping time.
    pub generation: Generation,
    /// The mapped selections.
    pub selections: Vec<TextRange>,
}

/// Result of [`SelectionSynchronizer::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Selections were written to the view.
    Applied,
    /// The originating product was republished; nothing was written.
    Stale,
}

/// Tracks open views and routes selection events through the product store.
#[derive(Debug)]
pub struct SelectionSynchronizer {
    store: SharedStore,
    views: HashMap<Url, ViewHandle>,
    echoes: EchoGuard<Url>,
    awaiting_open: HashSet<Url>,
    target_placement: ViewPlacement,
    source_placement: ViewPlacement,
    reveal: Reveal,
}

impl SelectionSynchronizer {
    /// Create a synchronizer over `store` with placements from `config`.
    pub fn new(store: SharedStore, config: &SessionConfig) -> Self {
        Self {
            store,
            views: HashMap::new(),
            echoes: EchoGuard::new(),
            awaiting_open: HashSet::new(),
            target_placement: config.target_placement(),
            source_placement: config.source_placement(),
            reveal: config.views.reveal,
        }
    }

    /// Remember that `uri` is shown in `view`.
    pub fn register_view(&mut self, uri: Url, view: ViewHandle) {
        self.views.insert(uri, view);
    }

    /// Forget a closed view.
    pub fn forget_view(&mut self, uri: &Url) {
        self.views.remove(uri);
        self.echoes.forget(uri);
        self.awaiting_open.remove(uri);
    }

    /// The session started opening `uri`.
    pub fn expect_open(&mut self, uri: Url) {
        self.awaiting_open.insert(uri);
    }

    /// An open of `uri` started by the session finished, successfully or not.
    pub fn open_finished(&mut self, uri: &Url) {
        self.awaiting_open.remove(uri);
    }

    /// Whether the session is still opening `uri`.
    pub fn is_opening(&self, uri: &Url) -> bool {
        self.awaiting_open.contains(uri)
    }

    /// Handle of the view showing `uri`, if known.
    pub fn view(&self, uri: &Url) -> Option<ViewHandle> {
        self.views.get(uri).copied()
    }

    /// Whether `uri` is shown in a known view.
    pub fn is_open(&self, uri: &Url) -> bool {
        self.views.contains_key(uri)
    }

    /// Placement used when opening product views.
    pub fn target_placement(&self) -> ViewPlacement {
        self.target_placement
    }

    /// A product's content was replaced; any write awaiting its echo is moot.
    pub fn content_replaced(&mut self, target: &TargetUri) {
        self.echoes.forget(target.as_url());
    }

    /// Handle a selection change reported by the editor.
    pub fn on_selection_changed(
        &mut self,
        uri: &Url,
        view: ViewHandle,
        selections: &[TextRange],
    ) -> Vec<PendingSelection> {
        self.register_view(uri.clone(), view);
        if self.awaiting_open.contains(uri) {
            tracing::debug!(%uri, "absorbed selection reported while opening");
            return Vec::new();
        }
        if self.echoes.absorb(uri, selections) {
            tracing::debug!(%uri, "absorbed echo of applied selections");
            return Vec::new();
        }

        let mut store = lock_store(&self.store);
        if store.codec().is_target(uri) {
            let target = TargetUri::from_url(uri.clone());
            let action = store.on_selection(&target);
            self.route(&store, &target, action, selections, Direction::Backward)
                .into_iter()
                .collect()
        } else {
            let source = SourceUri::from_url(uri.clone());
            let mut pending = Vec::new();
            for target in self.open_linked(&store, &source) {
                let action = store.on_selection(&target);
                pending.extend(self.route(&store, &target, action, selections, Direction::Forward));
            }
            pending
        }
    }

    /// Push `selections` of source document `uri` to all open linked views.
    ///
    /// Bypasses suppression and pre-arms each linked product.
    pub fn manual_sync(&mut self, uri: &Url, selections: &[TextRange]) -> Vec<PendingSelection> {
        let mut store = lock_store(&self.store);
        if store.codec().is_target(uri) {
            tracing::debug!(%uri, "manual sync requested on a product view");
            return Vec::new();
        }

        let source = SourceUri::from_url(uri.clone());
        let mut pending = Vec::new();
        for target in self.open_linked(&store, &source) {
            let action = store.on_manual_sync(&target);
            pending.extend(self.route(&store, &target, action, selections, Direction::Forward));
        }
        pending
    }

    /// Write a pending selection into its (now open) view.
    pub fn apply<E: Editor + ?Sized>(
        &mut self,
        editor: &E,
        view: ViewHandle,
        pending: PendingSelection,
    ) -> Result<ApplyOutcome, EditorError> {
        let current = lock_store(&self.store).is_current(&pending.origin, pending.generation);
        if !current {
            tracing::debug!(
                uri = %pending.document,
                origin = %pending.origin,
                generation = pending.generation.value(),
                "dropping stale selection"
            );
            return Ok(ApplyOutcome::Stale);
        }

        editor.set_selections(view, &pending.selections, self.reveal)?;
        self.register_view(pending.document.clone(), view);
        self.echoes.record(pending.document, pending.selections);
        Ok(ApplyOutcome::Applied)
    }

    fn open_linked(&self, store: &ProductStore, source: &SourceUri) -> Vec<TargetUri> {
        store
            .linked_targets(source)
            .into_iter()
            .filter(|target| self.is_open(target.as_url()))
            .collect()
    }

    fn route(
        &self,
        store: &ProductStore,
        target: &TargetUri,
        action: Action,
        selections: &[TextRange],
        direction: Direction,
    ) -> Option<PendingSelection> {
        match action {
            Action::Propagate => {}
            Action::Absorb => {
                tracing::debug!(uri = %target, "suppressed first selection after publish");
                return None;
            }
            Action::None => return None,
        }

        let stored = store.get(target);
        let mapped = stored.map_selections(selections, direction);
        if mapped.is_empty() {
            tracing::debug!(uri = %target, ?direction, "no selection mapped");
            return None;
        }

        let (document, placement) = match direction {
            Direction::Forward => (target.as_url().clone(), self.target_placement),
            Direction::Backward => (
                stored.product().source.as_url().clone(),
                self.source_placement,
            ),
        };
        Some(PendingSelection {
            document,
            placement,
            origin: target.clone(),
            generation: stored.generation(),
            selections: mapped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MockEditor;
    use monto_sync_types::{Product, RangePair};
    use std::sync::{Arc, Mutex};

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    fn product(range_map: Vec<RangePair>) -> Product {
        Product::new(
            SourceUri::parse("file:/a.mj").unwrap(),
            "target",
            "js",
            "generated",
            range_map,
        )
        .unwrap()
    }

    fn scenario() -> Vec<RangePair> {
        vec![RangePair::new(0, 5, 0, 3), RangePair::new(5, 10, 3, 9)]
    }

    struct Fixture {
        store: SharedStore,
        sync: SelectionSynchronizer,
        editor: MockEditor,
        source: Url,
        target: Url,
    }

    impl Fixture {
        fn new(range_map: Vec<RangePair>) -> Self {
            let store: SharedStore = Arc::new(Mutex::new(ProductStore::default()));
            let target = lock_store(&store).save(product(range_map)).unwrap();
            let sync = SelectionSynchronizer::new(store.clone(), &SessionConfig::default());
            Self {
                store,
                sync,
                editor: MockEditor::new(),
                source: url("file:///a.mj"),
                target: target.as_url().clone(),
            }
        }

        fn republish(&self, range_map: Vec<RangePair>) {
            lock_store(&self.store).save(product(range_map)).unwrap();
        }

        fn source_view(&self) -> ViewHandle {
            self.editor.open_now(&self.source)
        }

        fn target_view(&mut self) -> ViewHandle {
            let view = self.editor.open_now(&self.target);
            self.sync.register_view(self.target.clone(), view);
            view
        }

        fn select_source(&mut self, selections: &[TextRange]) -> Vec<PendingSelection> {
            let view = self.source_view();
            let source = self.source.clone();
            self.sync.on_selection_changed(&source, view, selections)
        }

        fn select_target(&mut self, selections: &[TextRange]) -> Vec<PendingSelection> {
            let view = self.target_view();
            let target = self.target.clone();
            self.sync.on_selection_changed(&target, view, selections)
        }

        fn apply_all(&mut self, pending: Vec<PendingSelection>) -> Vec<ApplyOutcome> {
            pending
                .into_iter()
                .map(|p| {
                    let view = self.editor.open_now(&p.document);
                    self.sync.apply(&self.editor, view, p).unwrap()
                })
                .collect()
        }
    }

    #[test]
    fn end_to_end_forward_and_backward() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();

        // First event after publish arms the product.
        assert!(fx.select_source(&[TextRange::caret(1)]).is_empty());

        let forward = fx.select_source(&[TextRange::caret(1)]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].document, fx.target);
        assert_eq!(forward[0].selections, vec![TextRange::new(0, 3)]);
        assert!(forward[0].placement.preserve_focus);

        let backward = fx.select_target(&[TextRange::caret(7)]);
        assert_eq!(backward.len(), 1);
        assert_eq!(backward[0].document, fx.source);
        assert_eq!(backward[0].selections, vec![TextRange::new(5, 10)]);
        assert!(!backward[0].placement.preserve_focus);

        assert_eq!(fx.apply_all(backward), vec![ApplyOutcome::Applied]);
        assert_eq!(
            fx.editor.selections_of(&fx.source),
            vec![TextRange::new(5, 10)]
        );
    }

    #[test]
    fn outermost_forward_innermost_backward() {
        let mut fx = Fixture::new(vec![
            RangePair::new(0, 10, 0, 20),
            RangePair::new(2, 4, 5, 8),
        ]);
        fx.target_view();
        fx.select_target(&[TextRange::caret(0)]);

        let forward = fx.select_source(&[TextRange::caret(3)]);
        assert_eq!(forward[0].selections, vec![TextRange::new(0, 20)]);

        let backward = fx.select_target(&[TextRange::caret(6)]);
        assert_eq!(backward[0].selections, vec![TextRange::new(2, 4)]);
    }

    #[test]
    fn first_event_suppressed_second_propagates() {
        let mut fx = Fixture::new(scenario());
        assert!(fx.select_target(&[TextRange::caret(7)]).is_empty());
        assert_eq!(fx.select_target(&[TextRange::caret(7)]).len(), 1);
    }

    #[test]
    fn republish_resets_suppression() {
        let mut fx = Fixture::new(scenario());
        fx.select_target(&[TextRange::caret(7)]);
        assert_eq!(fx.select_target(&[TextRange::caret(7)]).len(), 1);

        fx.republish(scenario());
        assert!(fx.select_target(&[TextRange::caret(7)]).is_empty());
        assert_eq!(fx.select_target(&[TextRange::caret(7)]).len(), 1);
    }

    #[test]
    fn unmapped_selections_are_dropped_individually() {
        let mut fx = Fixture::new(scenario());
        fx.select_target(&[TextRange::caret(0)]);

        let pending = fx.select_target(&[TextRange::caret(50), TextRange::caret(1)]);
        assert_eq!(pending[0].selections, vec![TextRange::new(0, 5)]);

        // Nothing mapped: no propagation at all.
        assert!(fx.select_target(&[TextRange::caret(50)]).is_empty());
    }

    #[test]
    fn forward_skips_products_without_open_views() {
        let mut fx = Fixture::new(scenario());
        assert!(fx.select_source(&[TextRange::caret(1)]).is_empty());
        assert!(fx.select_source(&[TextRange::caret(1)]).is_empty());

        // The product was never consulted, so it is still unarmed.
        fx.target_view();
        assert!(fx.select_source(&[TextRange::caret(1)]).is_empty());
        assert_eq!(fx.select_source(&[TextRange::caret(1)]).len(), 1);
    }

    #[test]
    fn unknown_product_view_never_propagates() {
        let mut fx = Fixture::new(scenario());
        let stray = url("monto:/b.mj-target.js");
        let view = fx.editor.open_now(&stray);
        for _ in 0..3 {
            assert!(fx
                .sync
                .on_selection_changed(&stray, view, &[TextRange::caret(1)])
                .is_empty());
        }
    }

    #[test]
    fn applied_selection_echo_is_absorbed() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();
        fx.select_source(&[TextRange::caret(1)]);
        let pending = fx.select_source(&[TextRange::caret(1)]);
        fx.apply_all(pending);

        // The editor reports our own write back: absorbed, nothing bounces.
        assert!(fx.select_target(&[TextRange::new(0, 3)]).is_empty());
        // A genuine user selection afterwards propagates.
        assert_eq!(fx.select_target(&[TextRange::caret(7)]).len(), 1);
    }

    #[test]
    fn manual_sync_bypasses_suppression_and_pre_arms() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();

        let pending = fx.sync.manual_sync(&fx.source.clone(), &[TextRange::caret(6)]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].selections, vec![TextRange::new(3, 9)]);
        fx.apply_all(pending);

        assert!(fx.select_target(&[TextRange::new(3, 9)]).is_empty());
        assert_eq!(fx.select_target(&[TextRange::caret(1)]).len(), 1);
    }

    #[test]
    fn manual_sync_from_product_view_does_nothing() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();
        let target = fx.target.clone();
        assert!(fx.sync.manual_sync(&target, &[TextRange::caret(1)]).is_empty());
    }

    #[test]
    fn stale_pending_selection_is_dropped() {
        let mut fx = Fixture::new(scenario());
        fx.select_target(&[TextRange::caret(7)]);
        let pending = fx.select_target(&[TextRange::caret(7)]);

        fx.republish(vec![RangePair::new(0, 1, 0, 1)]);
        assert_eq!(fx.apply_all(pending), vec![ApplyOutcome::Stale]);
        assert!(fx.editor.applied().is_empty());
    }

    #[test]
    fn republish_clears_pending_echo() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();
        let pending = fx.sync.manual_sync(&fx.source.clone(), &[TextRange::caret(1)]);
        fx.apply_all(pending);

        fx.republish(scenario());
        let target = TargetUri::from_url(fx.target.clone());
        fx.sync.content_replaced(&target);

        // Not an echo any more: the new snapshot's first event is suppressed
        // by the state machine instead.
        assert!(fx.select_target(&[TextRange::new(0, 3)]).is_empty());
        assert_eq!(fx.select_target(&[TextRange::new(0, 3)]).len(), 1);
    }

    #[test]
    fn forget_view_stops_forward_propagation() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();
        fx.select_source(&[TextRange::caret(1)]);
        assert_eq!(fx.select_source(&[TextRange::caret(1)]).len(), 1);

        let target = fx.target.clone();
        fx.sync.forget_view(&target);
        assert!(!fx.sync.is_open(&target));
        assert!(fx.select_source(&[TextRange::caret(1)]).is_empty());
    }

    #[test]
    fn selection_reported_while_opening_is_absorbed() {
        let mut fx = Fixture::new(scenario());
        fx.target_view();
        fx.select_target(&[TextRange::caret(7)]);
        let backward = fx.select_target(&[TextRange::caret(7)]);
        assert_eq!(backward.len(), 1);

        // Opening the source places its caret at 0 before the mapped
        // selection is written; that must not be pushed forward again.
        let source = fx.source.clone();
        fx.sync.expect_open(source.clone());
        assert!(fx.sync.is_opening(&source));
        assert!(fx.select_source(&[TextRange::caret(0)]).is_empty());

        fx.sync.open_finished(&source);
        assert_eq!(fx.apply_all(backward), vec![ApplyOutcome::Applied]);
        assert!(!fx.sync.is_opening(&source));

        // The product stayed armed; a genuine source selection propagates.
        let forward = fx.select_source(&[TextRange::caret(1)]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].selections, vec![TextRange::new(0, 3)]);
    }

    #[test]
    fn backward_sync_reaches_source_of_dashed_product() {
        let store: SharedStore = Arc::new(Mutex::new(ProductStore::default()));
        let dashed = Product::new(
            SourceUri::parse("file:/a.mj").unwrap(),
            "tar-get",
            "type-script",
            "generated",
            scenario(),
        )
        .unwrap();
        let target = lock_store(&store).save(dashed).unwrap().as_url().clone();
        let mut sync = SelectionSynchronizer::new(store, &SessionConfig::default());
        let editor = MockEditor::new();
        let view = editor.open_now(&target);

        sync.on_selection_changed(&target, view, &[TextRange::caret(7)]);
        let backward = sync.on_selection_changed(&target, view, &[TextRange::caret(7)]);
        assert_eq!(backward.len(), 1);
        assert_eq!(backward[0].document, url("file:///a.mj"));
        assert_eq!(backward[0].selections, vec![TextRange::new(5, 10)]);

        // Forward from the source finds the product as well.
        let source = url("file:///a.mj");
        let source_view = editor.open_now(&source);
        let forward = sync.on_selection_changed(&source, source_view, &[TextRange::caret(1)]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].document, target);
    }

    #[test]
    fn forget_view_clears_outstanding_open() {
        let mut fx = Fixture::new(scenario());
        let target = fx.target.clone();
        fx.sync.expect_open(target.clone());
        fx.sync.forget_view(&target);
        assert!(!fx.sync.is_opening(&target));
    }
}
