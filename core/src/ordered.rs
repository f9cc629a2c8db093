use crate::error::{IndexError, Result};

/// Immutable strictly increasing integer sequence.
///
/// Backs every decoded posting list and every intermediate result of query
/// resolution. Both set operations are two-pointer merges, so folding N sets
/// costs O(total elements).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedSet {
    items: Vec<u64>,
}

impl OrderedSet {
    /// Wraps `items`, rejecting any sequence that is not strictly increasing.
    pub fn new(items: Vec<u64>) -> Result<Self> {
        for i in 1..items.len() {
            if items[i - 1] >= items[i] {
                return Err(IndexError::UnorderedSequence(i));
            }
        }
        Ok(Self { items })
    }

    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Internal constructor for sequences that are increasing by construction.
    fn from_merged(items: Vec<u64>) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0] < w[1]));
        Self { items }
    }

    pub fn items(&self) -> &[u64] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().copied()
    }

    /// Classic two-pointer intersection: advance the smaller side, emit on
    /// equality.
    pub fn intersect(&self, other: &OrderedSet) -> OrderedSet {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            if self.items[i] < other.items[j] {
                i += 1;
            } else if self.items[i] > other.items[j] {
                j += 1;
            } else {
                result.push(self.items[i]);
                i += 1;
                j += 1;
            }
        }
        OrderedSet::from_merged(result)
    }

    /// Two-pointer union, emitting each shared value once.
    pub fn union(&self, other: &OrderedSet) -> OrderedSet {
        let mut result = Vec::with_capacity(self.items.len() + other.items.len());
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() || j < other.items.len() {
            if j == other.items.len() {
                result.push(self.items[i]);
                i += 1;
            } else if i == self.items.len() {
                result.push(other.items[j]);
                j += 1;
            } else if self.items[i] < other.items[j] {
                result.push(self.items[i]);
                i += 1;
            } else if self.items[i] > other.items[j] {
                result.push(other.items[j]);
                j += 1;
            } else {
                result.push(self.items[i]);
                i += 1;
                j += 1;
            }
        }
        OrderedSet::from_merged(result)
    }

    /// Subtracts `delta` from every element, dropping elements smaller than
    /// `delta`. Used to align phrase-word positions to the phrase start.
    pub fn shift_down(&self, delta: u64) -> OrderedSet {
        let shifted = self
            .items
            .iter()
            .filter_map(|&v| v.checked_sub(delta))
            .collect();
        OrderedSet::from_merged(shifted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[u64]) -> OrderedSet {
        OrderedSet::new(items.to_vec()).unwrap()
    }

    #[test]
    fn rejects_unsorted_and_duplicate_input() {
        assert!(OrderedSet::new(vec![3, 1]).is_err());
        assert!(OrderedSet::new(vec![3, 3]).is_err());
        assert!(OrderedSet::new(vec![1, 2, 9]).is_ok());
    }

    #[test]
    fn intersection_is_commutative() {
        let a = set(&[1, 3, 5, 7]);
        let b = set(&[3, 4, 5, 10]);
        assert_eq!(a.intersect(&b), b.intersect(&a));
        assert_eq!(a.intersect(&b).items(), &[3, 5]);
    }

    #[test]
    fn intersection_identities() {
        let a = set(&[2, 4, 8]);
        assert_eq!(a.intersect(&a), a);
        assert!(a.intersect(&OrderedSet::empty()).is_empty());
    }

    #[test]
    fn union_contains_each_element_once() {
        let a = set(&[1, 3, 5]);
        let b = set(&[2, 3, 6]);
        let u = a.union(&b);
        assert_eq!(u.items(), &[1, 2, 3, 5, 6]);
        assert_eq!(u, b.union(&a));
    }

    #[test]
    fn shift_down_drops_underflowing_elements() {
        let a = set(&[1, 2, 5]);
        assert_eq!(a.shift_down(2).items(), &[0, 3]);
        assert!(a.shift_down(9).is_empty());
    }
}
