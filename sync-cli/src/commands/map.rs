//! Map one offset through a product's range map.

use anyhow::{Context, Result};
use std::path::Path;

use monto_sync_client::SessionConfig;
use monto_sync_core::{Direction, ProductStore};

use super::read_product;

/// Run the map command, returning the line to print.
pub async fn run(
    config: &SessionConfig,
    path: &Path,
    offset: usize,
    direction: Direction,
) -> Result<String> {
    let payload = read_product(path).await?;
    let product = payload.into_product().context("Invalid product")?;

    let mut store = ProductStore::new(config.codec().context("Invalid document scheme")?);
    let target = store.save(product).context("Failed to store product")?;
    let stored = store.get(&target);

    let label = match direction {
        Direction::Forward => "forward",
        Direction::Backward => "backward",
    };
    let line = match stored.map_offset(offset, direction) {
        Some(pair) => {
            let span = direction.destination(&pair);
            format!("{target} {label} {offset} -> [{}, {})", span.start, span.end)
        }
        None => format!("{target} {label} {offset} -> unmapped"),
    };
    Ok(line)
}
