//! Error types for monto-sync.

use thiserror::Error;

use crate::RangePair;

/// Errors raised while decoding or validating published products.
#[derive(Debug, Error)]
pub enum MontoError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed (missing field, wrong type, negative offset)
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Unsupported JSON-RPC version marker
    #[error("unsupported jsonrpc version: {0}")]
    UnsupportedVersion(String),

    /// A notification arrived without its params object
    #[error("notification {method} has no params")]
    MissingParams {
        /// The notification method.
        method: String,
    },

    /// A document identifier could not be parsed
    #[error("invalid uri {uri}: {source}")]
    InvalidUri {
        /// The offending identifier.
        uri: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// A product identifier does not follow the `<path>-<name>.<language>` pattern
    #[error("not a product uri: {0}")]
    NotAProductUri(String),

    /// A range pair has begin > end on either side
    #[error("inverted span at rangeMap[{index}]: {pair:?}")]
    InvertedSpan {
        /// Position in the published range map.
        index: usize,
        /// The rejected pair.
        pair: RangePair,
    },
}
