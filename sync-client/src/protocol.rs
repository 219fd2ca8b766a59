//! Notification protocol: one-way product snapshots from the analysis process.
//!
//! Each `monto/publishProduct` notification carries a complete product. On
//! receipt the product is saved (which rebuilds its indices and signals the
//! provider) and then handed to the display policy. There is no
//! acknowledgement and no retry: a lost snapshot is superseded by the next.

use std::sync::Arc;

use thiserror::Error;

use monto_sync_types::{Generation, Message, MontoError, Product, TargetUri};

use crate::policy::{Display, DisplayPolicy};
use crate::provider::{lock_store, SharedStore};

/// Per-message protocol faults. The message is dropped, never repaired.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body is not a valid notification or its payload failed validation.
    #[error("malformed notification: {0}")]
    Malformed(#[from] MontoError),
}

/// Outcome of a successfully stored publish.
#[derive(Debug, Clone)]
pub struct Published {
    /// Identifier of the product document.
    pub target: TargetUri,
    /// Generation assigned by the store.
    pub generation: Generation,
    /// The display policy's decision.
    pub display: Display,
}

/// Decodes notifications, stores products and consults the display policy.
#[derive(Clone)]
pub struct NotificationProtocol {
    store: SharedStore,
    policy: Arc<dyn DisplayPolicy>,
}

impl NotificationProtocol {
    /// Create a handler over `store`.
    pub fn new(store: SharedStore, policy: Arc<dyn DisplayPolicy>) -> Self {
        Self { store, policy }
    }

    /// Handle one message body.
    ///
    /// Returns `Ok(None)` for messages that are not product publishes.
    pub fn receive(&self, body: &[u8]) -> Result<Option<Published>, ProtocolError> {
        match Message::from_bytes(body)? {
            Message::PublishProduct(payload) => {
                let product = payload.into_product()?;
                self.publish(product).map(Some)
            }
            Message::Ignored { method } => {
                tracing::debug!(?method, "ignoring non-product message");
                Ok(None)
            }
        }
    }

    /// Store an already decoded product and consult the display policy.
    pub fn publish(&self, product: Product) -> Result<Published, ProtocolError> {
        let (target, generation) = {
            let mut store = lock_store(&self.store);
            let target = store.save(product.clone())?;
            let generation = store.get(&target).generation();
            (target, generation)
        };
        tracing::debug!(
            uri = %target,
            generation = generation.value(),
            pairs = product.range_map.len(),
            "product stored"
        );
        if product.has_ambiguous_identity() {
            tracing::warn!(
                uri = %target,
                name = %product.name,
                language = %product.language,
                "product name or language contains '-'; its identifier does not decode to the source"
            );
        }

        let display = self.policy.decide(&product);
        Ok(Published {
            target,
            generation,
            display,
        })
    }
}

impl std::fmt::Debug for NotificationProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationProtocol").finish_non_exhaustive()
    }
}
