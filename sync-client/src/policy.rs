//! Display policy: what to do with a freshly published product.

use monto_sync_types::Product;

/// Decision returned by a [`DisplayPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    /// Open the product view beside the source, keeping focus where it is.
    Show,
    /// Store the product but do not surface it.
    Ignore,
}

/// Decides whether a published product is surfaced.
pub trait DisplayPolicy: Send + Sync {
    /// Called once per publish, after the product was stored.
    fn decide(&self, product: &Product) -> Display;
}

/// Surface every product.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowAll;

impl DisplayPolicy for ShowAll {
    fn decide(&self, _product: &Product) -> Display {
        Display::Show
    }
}

/// Never surface products; views are opened by the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowNone;

impl DisplayPolicy for ShowNone {
    fn decide(&self, _product: &Product) -> Display {
        Display::Ignore
    }
}

impl<F> DisplayPolicy for F
where
    F: Fn(&Product) -> Display + Send + Sync,
{
    fn decide(&self, product: &Product) -> Display {
        self(product)
    }
}
