//! Product store for monto-sync.
//!
//! The store owns the latest product for every product identifier together
//! with its [`RangeIndex`] and [`SyncState`]. Older snapshots are dropped on
//! replacement.
//!
//! Lookups never fail: an identifier that was never published resolves to a
//! neutral placeholder whose index maps every offset to the empty selection.

use std::collections::HashMap;
use std::fmt;

use monto_sync_types::{Generation, MontoError, Product, SourceUri, TargetUri, UriCodec};

use crate::index::{Direction, RangeIndex};
use crate::state::{Action, Event, SyncState};
use crate::{RangePair, TextRange};

/// Receives a signal after every save, once the new indices are in place.
pub trait ChangeListener: Send + Sync {
    /// Content for `uri` was replaced by the publish numbered `generation`.
    fn content_changed(&self, uri: &TargetUri, generation: Generation);
}

/// A product together with everything derived from it on save.
#[derive(Debug, Clone)]
pub struct StoredProduct {
    product: Product,
    index: RangeIndex,
    state: SyncState,
    generation: Generation,
}

impl StoredProduct {
    fn placeholder() -> Self {
        Self {
            product: Product::placeholder(),
            index: RangeIndex::neutral(),
            state: SyncState::new(),
            generation: Generation::zero(),
        }
    }

    /// The published product.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// The range index built when the product was saved.
    pub fn index(&self) -> &RangeIndex {
        &self.index
    }

    /// Current suppression state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Publish counter of this snapshot (zero for the placeholder).
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether this is the neutral placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.generation == Generation::zero()
    }

    /// Look up the pair governing `offset` in `direction`.
    pub fn map_offset(&self, offset: usize, direction: Direction) -> Option<RangePair> {
        self.index.map_offset(offset, direction)
    }

    /// Map selections through the index, dropping unmapped ones.
    pub fn map_selections(&self, selections: &[TextRange], direction: Direction) -> Vec<TextRange> {
        self.index.map_selections(selections, direction)
    }
}

/// Keyed storage of the latest product per product identifier.
pub struct ProductStore {
    codec: UriCodec,
    products: HashMap<TargetUri, StoredProduct>,
    placeholder: StoredProduct,
    generation: Generation,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl ProductStore {
    /// Create an empty store using `codec` to derive product identifiers.
    pub fn new(codec: UriCodec) -> Self {
        Self {
            codec,
            products: HashMap::new(),
            placeholder: StoredProduct::placeholder(),
            generation: Generation::zero(),
            listeners: Vec::new(),
        }
    }

    /// Register a listener for content changes.
    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    /// The codec used for product identifiers.
    pub fn codec(&self) -> &UriCodec {
        &self.codec
    }

    /// Store `product`, replacing any earlier snapshot with the same identity.
    ///
    /// Builds the range index, resets suppression to `Unarmed`, assigns a new
    /// generation and only then notifies listeners.
    pub fn save(&mut self, product: Product) -> Result<TargetUri, MontoError> {
        product.validate()?;
        let target = self
            .codec
            .encode(&product.source, &product.name, &product.language)?;

        let index = RangeIndex::build(&product.range_map);
        let state = match self.products.get(&target) {
            Some(previous) => previous.state.on_event(Event::Republished).0,
            None => SyncState::new(),
        };
        self.generation = self.generation.next();

        self.products.insert(
            target.clone(),
            StoredProduct {
                product,
                index,
                state,
                generation: self.generation,
            },
        );

        for listener in &self.listeners {
            listener.content_changed(&target, self.generation);
        }
        Ok(target)
    }

    /// The stored product for `uri`, or the neutral placeholder.
    pub fn get(&self, uri: &TargetUri) -> &StoredProduct {
        self.products.get(uri).unwrap_or(&self.placeholder)
    }

    /// Whether a product was ever published under `uri`.
    pub fn contains(&self, uri: &TargetUri) -> bool {
        self.products.contains_key(uri)
    }

    /// Content of the stored product, if one was published.
    pub fn content(&self, uri: &TargetUri) -> Option<&str> {
        self.products.get(uri).map(|p| p.product.content.as_str())
    }

    /// Generation of the stored product, if one was published.
    pub fn generation(&self, uri: &TargetUri) -> Option<Generation> {
        self.products.get(uri).map(|p| p.generation)
    }

    /// Whether `generation` is still the latest publish for `uri`.
    pub fn is_current(&self, uri: &TargetUri, generation: Generation) -> bool {
        self.generation(uri) == Some(generation)
    }

    /// Feed a selection-change event on `uri`'s view through its state machine.
    ///
    /// Unknown identifiers absorb every event: the placeholder never arms.
    pub fn on_selection(&mut self, uri: &TargetUri) -> Action {
        self.transition(uri, Event::SelectionChanged)
            .unwrap_or(Action::Absorb)
    }

    /// Pre-arm `uri` for an explicit sync. Unknown identifiers do nothing.
    pub fn on_manual_sync(&mut self, uri: &TargetUri) -> Action {
        self.transition(uri, Event::ManualSync)
            .unwrap_or(Action::None)
    }

    fn transition(&mut self, uri: &TargetUri, event: Event) -> Option<Action> {
        let stored = self.products.get_mut(uri)?;
        let (state, action) = stored.state.on_event(event);
        stored.state = state;
        Some(action)
    }

    /// Product identifiers published for `source`, in stable order.
    ///
    /// Matches on the recorded source, so products whose identifier does not
    /// decode cleanly are still linked.
    pub fn linked_targets(&self, source: &SourceUri) -> Vec<TargetUri> {
        let mut linked: Vec<TargetUri> = self
            .products
            .iter()
            .filter(|(_, stored)| stored.product.source.same_document(source))
            .map(|(target, _)| target.clone())
            .collect();
        linked.sort_by(|a, b| a.as_url().as_str().cmp(b.as_url().as_str()));
        linked
    }

    /// Number of stored products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new(UriCodec::default())
    }
}

impl fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductStore")
            .field("codec", &self.codec)
            .field("products", &self.products.len())
            .field("generation", &self.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
