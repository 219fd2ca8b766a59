//! Mock channel for testing.
//!
//! Allows queueing message bodies and injecting receive failures.

use super::{Channel, ChannelError};
use async_trait::async_trait;
use monto_sync_types::{Message, MontoError, PublishProduct};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock channel for testing.
///
/// `recv()` drains the queue and reports the end of the stream once it is
/// empty.
#[derive(Debug, Clone)]
pub struct MockChannel {
    inner: Arc<Mutex<MockChannelInner>>,
}

#[derive(Debug)]
struct MockChannelInner {
    open: bool,
    queue: VecDeque<Vec<u8>>,
    received: usize,
    fail_next_recv: Option<String>,
}

impl MockChannel {
    /// Create a new open mock channel.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockChannelInner {
                open: true,
                queue: VecDeque::new(),
                received: 0,
                fail_next_recv: None,
            })),
        }
    }

    /// Queue a raw message body.
    pub fn queue_message(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push_back(data);
    }

    /// Queue a `monto/publishProduct` notification.
    pub fn queue_product(&self, payload: PublishProduct) -> Result<(), MontoError> {
        let bytes = Message::PublishProduct(payload).to_bytes()?;
        self.queue_message(bytes);
        Ok(())
    }

    /// Number of bodies handed out so far.
    pub fn received_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.received
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_recv = Some(error.to_string());
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn recv(&self) -> Result<Option<Vec<u8>>, ChannelError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.open {
            return Err(ChannelError::Closed);
        }

        // Check for forced failure
        if let Some(error) = inner.fail_next_recv.take() {
            return Err(ChannelError::ReceiveFailed(error));
        }

        let next = inner.queue.pop_front();
        if next.is_some() {
            inner.received += 1;
        }
        Ok(next)
    }

    fn is_open(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.open
    }

    async fn close(&self) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        inner.open = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monto_sync_types::RangePair;

    #[tokio::test]
    async fn drains_in_order_then_ends() {
        let channel = MockChannel::new();
        channel.queue_message(b"one".to_vec());
        channel.queue_message(b"two".to_vec());

        assert_eq!(channel.recv().await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(channel.recv().await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(channel.recv().await.unwrap(), None);
        assert_eq!(channel.received_count(), 2);
    }

    #[tokio::test]
    async fn queued_product_decodes() {
        let channel = MockChannel::new();
        channel
            .queue_product(PublishProduct {
                uri: "file:/a.mj".into(),
                name: "target".into(),
                language: "js".into(),
                content: "x".into(),
                range_map: vec![RangePair::new(0, 1, 0, 1)],
            })
            .unwrap();
        let body = channel.recv().await.unwrap().unwrap();
        assert!(matches!(
            Message::from_bytes(&body).unwrap(),
            Message::PublishProduct(_)
        ));
    }

    #[tokio::test]
    async fn forced_recv_failure() {
        let channel = MockChannel::new();
        channel.queue_message(b"data".to_vec());
        channel.fail_next_recv("pipe broke");

        let result = channel.recv().await;
        assert!(matches!(result, Err(ChannelError::ReceiveFailed(_))));

        // Next recv should work (and get the queued data)
        assert_eq!(channel.recv().await.unwrap(), Some(b"data".to_vec()));
    }

    #[tokio::test]
    async fn closed_channel_rejects_recv() {
        let channel = MockChannel::new();
        channel.close().await.unwrap();
        assert!(!channel.is_open());
        assert!(matches!(channel.recv().await, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let a = MockChannel::new();
        let b = a.clone();
        a.queue_message(b"shared".to_vec());
        assert_eq!(b.recv().await.unwrap(), Some(b"shared".to_vec()));
    }
}
