//! Lazy combination enumeration
//!
//! Yields the cartesian product of the filter dimensions in nested
//! (lexicographic) order: the last-declared dimension varies fastest. The
//! sequence is finite, non-restartable, and deterministic for identical
//! input; no combination is skipped or reordered.

use crate::domain::{Combination, FilterDimensionSet};
use std::sync::Arc;

/// Iterator over all combinations of a [`FilterDimensionSet`]
pub struct CombinationIter {
    values: Vec<Vec<String>>,
    names: Arc<Vec<String>>,
    // Mixed-radix counter; one index per dimension.
    indices: Vec<usize>,
    sequence: u64,
    total: u64,
    exhausted: bool,
}

impl CombinationIter {
    /// Create an enumerator over the given dimension set
    pub fn new(set: &FilterDimensionSet) -> Self {
        let values: Vec<Vec<String>> = set
            .dimensions()
            .iter()
            .map(|d| d.values.clone())
            .collect();
        let total = set.total_combinations();

        Self {
            names: set.shared_names(),
            indices: vec![0; values.len()],
            values,
            sequence: 0,
            total,
            exhausted: total == 0,
        }
    }

    /// Total number of combinations this enumerator will yield
    pub fn total(&self) -> u64 {
        self.total
    }

    // Advance the counter, incrementing the last dimension first.
    fn advance(&mut self) {
        for i in (0..self.indices.len()).rev() {
            self.indices[i] += 1;
            if self.indices[i] < self.values[i].len() {
                return;
            }
            self.indices[i] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for CombinationIter {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        if self.exhausted {
            return None;
        }

        let current: Vec<String> = self
            .indices
            .iter()
            .enumerate()
            .map(|(dim, &idx)| self.values[dim][idx].clone())
            .collect();

        self.sequence += 1;
        let combination = Combination::new(self.sequence, Arc::clone(&self.names), current);
        self.advance();
        Some(combination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.sequence) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilterDimensionSet;

    fn set(pairs: &[(&str, &str)]) -> FilterDimensionSet {
        FilterDimensionSet::from_raw_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_nested_order_last_dimension_fastest() {
        let set = set(&[("port", "A,B"), ("code", "X,Y")]);
        let values: Vec<Vec<String>> = CombinationIter::new(&set)
            .map(|c| c.values().to_vec())
            .collect();

        assert_eq!(
            values,
            vec![
                vec!["A", "X"],
                vec!["A", "Y"],
                vec!["B", "X"],
                vec!["B", "Y"],
            ]
        );
    }

    #[test]
    fn test_count_matches_product_of_dimension_sizes() {
        let set = set(&[("a", "1,2,3"), ("b", "x,y"), ("c", "p,q")]);
        let iter = CombinationIter::new(&set);
        assert_eq!(iter.total(), 12);
        assert_eq!(iter.count(), 12);
    }

    #[test]
    fn test_sequence_numbers_are_monotonic_from_one() {
        let set = set(&[("a", "1,2"), ("b", "x")]);
        let sequences: Vec<u64> = CombinationIter::new(&set).map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn test_single_dimension() {
        let set = set(&[("port", "A,B,C")]);
        let values: Vec<String> = CombinationIter::new(&set)
            .map(|c| c.values()[0].clone())
            .collect();
        assert_eq!(values, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_set_yields_nothing() {
        let set = FilterDimensionSet::new();
        let mut iter = CombinationIter::new(&set);
        assert_eq!(iter.total(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let set = set(&[("a", "1,2"), ("b", "x,y,z")]);
        let first: Vec<Vec<String>> = CombinationIter::new(&set)
            .map(|c| c.values().to_vec())
            .collect();
        let second: Vec<Vec<String>> = CombinationIter::new(&set)
            .map(|c| c.values().to_vec())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_size_hint_shrinks() {
        let set = set(&[("a", "1,2")]);
        let mut iter = CombinationIter::new(&set);
        assert_eq!(iter.size_hint(), (2, Some(2)));
        iter.next();
        assert_eq!(iter.size_hint(), (1, Some(1)));
    }
}
