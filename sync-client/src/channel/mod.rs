//! Notification channel abstraction for monto-sync.
//!
//! The analysis process pushes one-way notifications; the client only ever
//! reads. A channel yields complete JSON-RPC message bodies:
//! - `recv()` returns the next body, or `None` once the stream has ended
//! - `close()` stops reading
//!
//! [`FramedChannel`] reads LSP base-protocol frames from any async reader
//! (typically the analysis process's stdout); [`MockChannel`] is for tests.

mod framed;
mod mock;

pub use framed::{encode_frame, FramedChannel};
pub use mock::MockChannel;

use async_trait::async_trait;
use thiserror::Error;

/// Maximum accepted message body (64 MiB).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was closed locally.
    #[error("channel closed")]
    Closed,

    /// A frame header was missing or malformed.
    #[error("framing error: {0}")]
    Framing(String),

    /// A frame announced more bytes than allowed.
    #[error("message too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// Announced body size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of notification bodies pushed by the analysis process.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Receive the next message body.
    ///
    /// Returns `Ok(None)` once the stream has ended cleanly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, ChannelError>;

    /// Check if the channel is still open.
    fn is_open(&self) -> bool;

    /// Stop reading.
    async fn close(&self) -> Result<(), ChannelError>;
}
