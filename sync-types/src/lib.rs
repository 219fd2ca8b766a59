//! # sync-types
//!
//! Wire format types for Monto product publishing and selection sync.
//!
//! This crate provides the foundational types used across all monto-sync crates:
//! - [`SourceUri`], [`TargetUri`], [`UriCodec`] - Document identity and the
//!   mapping between a source document and its derived product documents
//! - [`Generation`] - Ordering of successive publishes
//! - [`Product`], [`RangePair`] - The published artifact and its range table
//! - [`Envelope`] - JSON-RPC framing of notifications
//! - [`Message`], [`PublishProduct`] - Protocol payloads
//! - [`MontoError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod ids;
mod messages;
mod product;

pub use envelope::{Envelope, JSONRPC_VERSION};
pub use error::MontoError;
pub use ids::{
    Generation, SourceUri, TargetUri, UriCodec, DEFAULT_SCHEME, DEFAULT_SOURCE_SCHEME,
};
pub use messages::{Message, PublishProduct};
pub use product::{Product, RangePair};
