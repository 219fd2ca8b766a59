//! LSP base-protocol framing over an async byte stream.
//!
//! Each message is a header block followed by a body:
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","method":"monto/publishProduct",...}
//! ```
//!
//! Headers other than `Content-Length` are ignored.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::Mutex;

use super::{Channel, ChannelError, MAX_MESSAGE_SIZE};

const CONTENT_LENGTH: &str = "content-length";

/// Longest header line accepted, terminator included.
const MAX_HEADER_LINE: u64 = 8 * 1024;

/// Reads framed message bodies from `R`.
pub struct FramedChannel<R> {
    reader: Mutex<BufReader<R>>,
    open: AtomicBool,
}

impl<R: AsyncRead + Unpin + Send> FramedChannel<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(BufReader::new(reader)),
            open: AtomicBool::new(true),
        }
    }

    async fn read_frame(reader: &mut BufReader<R>) -> Result<Option<Vec<u8>>, ChannelError> {
        let mut length: Option<usize> = None;
        let mut line = String::new();
        let mut first = true;

        loop {
            line.clear();
            let n = (&mut *reader)
                .take(MAX_HEADER_LINE)
                .read_line(&mut line)
                .await?;
            if n as u64 == MAX_HEADER_LINE && !line.ends_with('\n') {
                return Err(ChannelError::Framing(format!(
                    "header line exceeds {MAX_HEADER_LINE} bytes"
                )));
            }
            if n == 0 {
                if first {
                    return Ok(None);
                }
                return Err(ChannelError::Framing("stream ended inside header".into()));
            }
            first = false;

            let header = line.trim_end_matches(['\r', '\n']);
            if header.is_empty() {
                break;
            }
            let Some((name, value)) = header.split_once(':') else {
                return Err(ChannelError::Framing(format!("malformed header {header:?}")));
            };
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                let parsed = value.trim().parse::<usize>().map_err(|_| {
                    ChannelError::Framing(format!("invalid Content-Length {:?}", value.trim()))
                })?;
                length = Some(parsed);
            }
        }

        let length =
            length.ok_or_else(|| ChannelError::Framing("missing Content-Length".into()))?;
        if length > MAX_MESSAGE_SIZE {
            return Err(ChannelError::TooLarge {
                size: length,
                limit: MAX_MESSAGE_SIZE,
            });
        }

        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).await?;
        Ok(Some(body))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> Channel for FramedChannel<R> {
    async fn recv(&self) -> Result<Option<Vec<u8>>, ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        let mut reader = self.reader.lock().await;
        Self::read_frame(&mut reader).await
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn close(&self) -> Result<(), ChannelError> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }
}

/// Frame a message body for writing to a base-protocol stream.
pub fn encode_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    frame.extend_from_slice(body);
    frame
}
