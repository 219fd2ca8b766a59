//! Products and their range correspondence tables.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{MontoError, SourceUri};

/// One correspondence between a source span and a product span.
///
/// Both spans are half-open offsets: `[sbegin, send)` into the source,
/// `[tbegin, tend)` into the product content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RangePair {
    /// Start of the source span
    pub sbegin: usize,
    /// End of the source span (exclusive)
    pub send: usize,
    /// Start of the product span
    pub tbegin: usize,
    /// End of the product span (exclusive)
    pub tend: usize,
}

impl RangePair {
    /// The zero-length pair that maps every offset to the empty selection.
    pub const DEGENERATE: RangePair = RangePair::new(0, 0, 0, 0);

    /// Create a new pair.
    pub const fn new(sbegin: usize, send: usize, tbegin: usize, tend: usize) -> Self {
        Self {
            sbegin,
            send,
            tbegin,
            tend,
        }
    }

    /// The source span.
    pub fn source(&self) -> Range<usize> {
        self.sbegin..self.send
    }

    /// The product span.
    pub fn target(&self) -> Range<usize> {
        self.tbegin..self.tend
    }

    /// Size of the product span, the sort key of the range index.
    pub fn target_len(&self) -> usize {
        self.tend.saturating_sub(self.tbegin)
    }

    /// Whether `offset` lies in `[sbegin, send)`.
    pub fn source_contains(&self, offset: usize) -> bool {
        self.sbegin <= offset && offset < self.send
    }

    /// Whether `offset` lies in `[tbegin, tend)`.
    pub fn target_contains(&self, offset: usize) -> bool {
        self.tbegin <= offset && offset < self.tend
    }

    /// Whether both spans are well formed (begin <= end).
    pub fn is_ordered(&self) -> bool {
        self.sbegin <= self.send && self.tbegin <= self.tend
    }
}

/// A named, languaged artifact derived from one source document.
///
/// Always a complete snapshot: a newer product with the same
/// `(source, name, language)` replaces this one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// The document this product was derived from.
    pub source: SourceUri,
    /// Product kind, e.g. "outline" or "target".
    pub name: String,
    /// Display language of `content`.
    pub language: String,
    /// Full text of the product.
    pub content: String,
    /// Correspondence table between source and product spans.
    pub range_map: Vec<RangePair>,
}

impl Product {
    /// Build a product, validating its spans.
    pub fn new(
        source: SourceUri,
        name: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
        range_map: Vec<RangePair>,
    ) -> Result<Self, MontoError> {
        let product = Self {
            source,
            name: name.into(),
            language: language.into(),
            content: content.into(),
            range_map,
        };
        product.validate()?;
        Ok(product)
    }

    /// The neutral placeholder: empty content and a single degenerate pair.
    pub fn placeholder() -> Self {
        Self {
            source: SourceUri::root(),
            name: String::new(),
            language: String::new(),
            content: String::new(),
            range_map: vec![RangePair::DEGENERATE],
        }
    }

    /// Check the invariants a published product must hold.
    pub fn validate(&self) -> Result<(), MontoError> {
        for (index, pair) in self.range_map.iter().enumerate() {
            if !pair.is_ordered() {
                return Err(MontoError::InvertedSpan { index, pair: *pair });
            }
        }
        Ok(())
    }

    /// Whether the product identifier cannot be cut back into its source.
    ///
    /// The identifier is cut at its last `-`, so a `-` in the name or the
    /// language moves the cut. Such products are still stored and linked by
    /// their recorded source.
    pub fn has_ambiguous_identity(&self) -> bool {
        self.name.contains('-') || self.language.contains('-')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> SourceUri {
        SourceUri::parse("file:/a.mj").unwrap()
    }

    #[test]
    fn containment_is_half_open() {
        let pair = RangePair::new(2, 4, 5, 8);
        assert!(!pair.source_contains(1));
        assert!(pair.source_contains(2));
        assert!(pair.source_contains(3));
        assert!(!pair.source_contains(4));
        assert!(pair.target_contains(5));
        assert!(pair.target_contains(7));
        assert!(!pair.target_contains(8));
    }

    #[test]
    fn degenerate_contains_nothing() {
        let pair = RangePair::DEGENERATE;
        assert!(!pair.source_contains(0));
        assert!(!pair.target_contains(0));
        assert_eq!(pair.target_len(), 0);
        assert_eq!(pair.source(), 0..0);
    }

    #[test]
    fn new_product_validates() {
        let product = Product::new(src(), "target", "js", "abc", vec![RangePair::new(0, 1, 0, 3)]);
        assert!(product.is_ok());
    }

    #[test]
    fn inverted_source_span_rejected() {
        let err = Product::new(
            src(),
            "target",
            "js",
            "",
            vec![RangePair::new(0, 1, 0, 1), RangePair::new(4, 2, 0, 1)],
        )
        .unwrap_err();
        assert!(matches!(err, MontoError::InvertedSpan { index: 1, .. }));
    }

    #[test]
    fn inverted_target_span_rejected() {
        let err = Product::new(src(), "target", "js", "", vec![RangePair::new(0, 1, 3, 2)])
            .unwrap_err();
        assert!(matches!(err, MontoError::InvertedSpan { index: 0, .. }));
    }

    #[test]
    fn empty_name_and_language_accepted() {
        let product = Product::new(src(), "", "", "", vec![]).unwrap();
        assert!(!product.has_ambiguous_identity());
    }

    #[test]
    fn dashed_language_accepted_but_ambiguous() {
        let product = Product::new(src(), "target", "type-script", "", vec![]).unwrap();
        assert!(product.has_ambiguous_identity());
        assert!(!Product::new(src(), "target", "ts", "", vec![])
            .unwrap()
            .has_ambiguous_identity());
    }

    #[test]
    fn placeholder_shape() {
        let p = Product::placeholder();
        assert!(p.content.is_empty());
        assert_eq!(p.range_map, vec![RangePair::DEGENERATE]);
    }
}
