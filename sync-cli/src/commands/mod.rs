//! CLI command implementations.

pub mod map;
pub mod replay;

use anyhow::{Context, Result};
use std::path::Path;

use monto_sync_types::PublishProduct;

/// Read a product file: either bare `monto/publishProduct` params or a full
/// notification body.
pub async fn read_product(path: &Path) -> Result<PublishProduct> {
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if let Ok(payload) = serde_json::from_slice::<PublishProduct>(&contents) {
        return Ok(payload);
    }
    match monto_sync_types::Message::from_bytes(&contents)
        .context("Not a product or publish notification")?
    {
        monto_sync_types::Message::PublishProduct(payload) => Ok(payload),
        monto_sync_types::Message::Ignored { method } => {
            anyhow::bail!("Not a publish notification (method: {method:?})")
        }
    }
}
