//! # sync-core
//!
//! Pure selection-sync logic for monto-sync (no I/O, instant tests).
//!
//! This crate implements the product store, the bidirectional range index
//! and the echo-suppression state machine without any editor or channel
//! access, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! Opening views and writing selections is performed by `sync-client`, which
//! interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod echo;
pub mod index;
pub mod state;
pub mod store;

pub use echo::EchoGuard;
pub use index::{Direction, RangeIndex, TextRange};
pub use monto_sync_types::RangePair;
pub use state::{Action, Event, SyncState};
pub use store::{ChangeListener, ProductStore, StoredProduct};
