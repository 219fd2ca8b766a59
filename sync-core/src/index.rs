//! Bidirectional range index over a product's range map.
//!
//! The index keeps two orderings of the same pairs, sorted by the size of
//! their product span:
//! - ascending, searched for product offsets, so the innermost span wins
//! - descending, searched for source offsets, so the outermost span wins
//!
//! Both sorts are stable: among pairs of equal size the first published wins.

use std::ops::Range;

use monto_sync_types::RangePair;

/// Which way a selection travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Source offset to product span.
    Forward,
    /// Product offset to source span.
    Backward,
}

impl Direction {
    /// The span of `pair` on the destination side of this direction.
    pub fn destination(&self, pair: &RangePair) -> Range<usize> {
        match self {
            Direction::Forward => pair.target(),
            Direction::Backward => pair.source(),
        }
    }
}

/// A selection expressed as character offsets into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    /// Start offset (also the offset used for mapping).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl TextRange {
    /// Create a new range.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A collapsed range (cursor) at `offset`.
    pub const fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Pre-sorted lookup structure built once per stored product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeIndex {
    by_target_size_asc: Vec<RangePair>,
    by_target_size_desc: Vec<RangePair>,
    fallback: Option<RangePair>,
}

impl RangeIndex {
    /// Build both orderings from a published range map.
    pub fn build(range_map: &[RangePair]) -> Self {
        let mut by_target_size_asc = range_map.to_vec();
        by_target_size_asc.sort_by_key(RangePair::target_len);

        let mut by_target_size_desc = range_map.to_vec();
        by_target_size_desc.sort_by(|a, b| b.target_len().cmp(&a.target_len()));

        Self {
            by_target_size_asc,
            by_target_size_desc,
            fallback: None,
        }
    }

    /// The index of the neutral placeholder product.
    ///
    /// Every lookup answers [`RangePair::DEGENERATE`], which maps any offset
    /// to the empty selection at the start of the document.
    pub fn neutral() -> Self {
        Self {
            by_target_size_asc: vec![RangePair::DEGENERATE],
            by_target_size_desc: vec![RangePair::DEGENERATE],
            fallback: Some(RangePair::DEGENERATE),
        }
    }

    /// Pairs ordered by ascending product span size.
    pub fn ascending(&self) -> &[RangePair] {
        &self.by_target_size_asc
    }

    /// Pairs ordered by descending product span size.
    pub fn descending(&self) -> &[RangePair] {
        &self.by_target_size_desc
    }

    /// Number of pairs indexed.
    pub fn len(&self) -> usize {
        self.by_target_size_asc.len()
    }

    /// Whether the index holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.by_target_size_asc.is_empty()
    }

    /// Find the pair governing `offset` when travelling in `direction`.
    ///
    /// Backward searches the ascending order for a pair whose product span
    /// contains `offset` (innermost wins); forward searches the descending
    /// order for a pair whose source span contains `offset` (outermost wins).
    /// Returns `None` when no pair contains the offset.
    pub fn map_offset(&self, offset: usize, direction: Direction) -> Option<RangePair> {
        let found = match direction {
            Direction::Backward => self
                .by_target_size_asc
                .iter()
                .find(|pair| pair.target_contains(offset)),
            Direction::Forward => self
                .by_target_size_desc
                .iter()
                .find(|pair| pair.source_contains(offset)),
        };
        found.copied().or(self.fallback)
    }

    /// Map every selection by its start offset, dropping the unmapped ones.
    ///
    /// Selections landing on a span already produced are collapsed into it,
    /// keeping first-seen order.
    pub fn map_selections(&self, selections: &[TextRange], direction: Direction) -> Vec<TextRange> {
        let mut mapped: Vec<TextRange> = Vec::with_capacity(selections.len());
        for pair in selections
            .iter()
            .filter_map(|selection| self.map_offset(selection.start, direction))
        {
            let range = TextRange::from(direction.destination(&pair));
            if !mapped.contains(&range) {
                mapped.push(range);
            }
        }
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> RangeIndex {
        RangeIndex::build(&[
            RangePair::new(2, 4, 5, 8),   // inner
            RangePair::new(0, 10, 0, 20), // outer
        ])
    }

    #[test]
    fn orderings_are_sorted_by_target_size() {
        let index = RangeIndex::build(&[
            RangePair::new(0, 1, 0, 5),
            RangePair::new(0, 1, 0, 1),
            RangePair::new(0, 1, 0, 9),
        ]);
        let asc: Vec<_> = index.ascending().iter().map(RangePair::target_len).collect();
        let desc: Vec<_> = index.descending().iter().map(RangePair::target_len).collect();
        assert_eq!(asc, vec![1, 5, 9]);
        assert_eq!(desc, vec![9, 5, 1]);
    }

    #[test]
    fn forward_prefers_outermost() {
        let pair = nested().map_offset(3, Direction::Forward).unwrap();
        assert_eq!(pair.target(), 0..20);
    }

    #[test]
    fn backward_prefers_innermost() {
        let pair = nested().map_offset(6, Direction::Backward).unwrap();
        assert_eq!(pair.source(), 2..4);
    }

    #[test]
    fn offsets_outside_inner_fall_to_outer() {
        let index = nested();
        assert_eq!(
            index.map_offset(12, Direction::Backward).unwrap().source(),
            0..10
        );
        assert_eq!(index.map_offset(9, Direction::Forward).unwrap().target(), 0..20);
    }

    #[test]
    fn uncontained_offset_is_unmapped() {
        let index = nested();
        assert_eq!(index.map_offset(20, Direction::Backward), None);
        assert_eq!(index.map_offset(10, Direction::Forward), None);
    }

    #[test]
    fn empty_spans_never_match() {
        let index = RangeIndex::build(&[RangePair::new(3, 3, 4, 4)]);
        assert_eq!(index.map_offset(3, Direction::Forward), None);
        assert_eq!(index.map_offset(4, Direction::Backward), None);
    }

    #[test]
    fn equal_sizes_keep_publish_order() {
        let index = RangeIndex::build(&[
            RangePair::new(0, 5, 0, 4),
            RangePair::new(1, 3, 0, 4),
        ]);
        assert_eq!(
            index.map_offset(2, Direction::Backward).unwrap().source(),
            0..5
        );
        assert_eq!(index.map_offset(2, Direction::Forward).unwrap().source(), 0..5);
    }

    #[test]
    fn innermost_wins_for_every_contained_offset() {
        let pairs = [
            RangePair::new(0, 30, 0, 40),
            RangePair::new(2, 10, 3, 15),
            RangePair::new(4, 6, 5, 9),
            RangePair::new(12, 20, 20, 30),
            RangePair::new(14, 15, 22, 24),
        ];
        let index = RangeIndex::build(&pairs);
        for pair in &pairs {
            for offset in pair.target() {
                let found = index.map_offset(offset, Direction::Backward).unwrap();
                let smallest = pairs
                    .iter()
                    .filter(|p| p.target_contains(offset))
                    .map(RangePair::target_len)
                    .min()
                    .unwrap();
                assert_eq!(found.target_len(), smallest, "offset {offset}");
            }
        }
    }

    #[test]
    fn neutral_index_maps_everything_to_degenerate() {
        let index = RangeIndex::neutral();
        for offset in [0, 1, 17, usize::MAX] {
            for direction in [Direction::Forward, Direction::Backward] {
                let pair = index.map_offset(offset, direction).unwrap();
                assert_eq!(pair, RangePair::DEGENERATE);
                assert_eq!(direction.destination(&pair), 0..0);
            }
        }
    }

    #[test]
    fn map_selections_drops_unmapped() {
        let index = RangeIndex::build(&[RangePair::new(0, 5, 0, 3), RangePair::new(5, 10, 3, 9)]);
        let mapped = index.map_selections(
            &[TextRange::caret(1), TextRange::caret(42), TextRange::new(7, 9)],
            Direction::Forward,
        );
        assert_eq!(mapped, vec![TextRange::new(0, 3), TextRange::new(3, 9)]);
    }

    #[test]
    fn map_selections_all_unmapped_is_empty() {
        let index = RangeIndex::build(&[RangePair::new(0, 5, 0, 3)]);
        assert!(index
            .map_selections(&[TextRange::caret(99)], Direction::Backward)
            .is_empty());
    }

    #[test]
    fn map_selections_collapses_duplicate_spans() {
        let index = RangeIndex::build(&[RangePair::new(0, 5, 0, 3), RangePair::new(5, 10, 3, 9)]);
        let mapped = index.map_selections(
            &[
                TextRange::caret(6),
                TextRange::caret(1),
                TextRange::new(8, 9),
                TextRange::caret(2),
            ],
            Direction::Forward,
        );
        assert_eq!(mapped, vec![TextRange::new(3, 9), TextRange::new(0, 3)]);
    }
}
