//! Tables indexed by a subset and one of its supersets.
//!
//! The nonsymmetric dynamic programs store a value for every pair `(R, U)` with
//! `R ⊆ U ⊆ {0..n}`. A full `2^n × 2^n` table would waste almost all of its
//! cells, so each superset gets its own dense row instead:
//!
//! ```text
//! rows[U] has 2^|U| cells
//! (R, U) → rows[U][compress_bits(R, U)]
//! ```
//!
//! `compress_bits` packs the bits of `R` that sit under `U` into the low bits,
//! which is a bijection between the submasks of `U` and `0..2^|U|`.
//! The total size is `Σ_U 2^|U| = 3^n` cells.

use std::ops::{Index, IndexMut};

use crate::bits::{compress_bits, Mask};

/// Maximum universe size supported by [`SubsetTable`].
pub const MAX_NODES: usize = 30;

/// A table holding one value for every pair `(R, U)` with `R ⊆ U`.
#[derive(Debug, Clone)]
pub struct SubsetTable<T> {
    num_nodes: usize,
    rows: Vec<Vec<T>>,
}

impl<T> SubsetTable<T>
where
    T: Clone + Default,
{
    /// Create a table over the universe `{0..n}` with every cell set to `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if `n > 30`.
    pub fn new(n: usize) -> Self {
        assert!(n <= MAX_NODES, "SubsetTable supports at most {} nodes, got {}", MAX_NODES, n);
        let rows = (0..1u32 << n).map(|u| vec![T::default(); 1 << u.count_ones()]).collect();
        Self { num_nodes: n, rows }
    }
}

impl<T> SubsetTable<T> {
    /// Size of the universe.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    fn slot(r: Mask, u: Mask) -> usize {
        debug_assert_eq!(r & !u, 0, "{:#b} is not a subset of {:#b}", r, u);
        compress_bits(r, u) as usize
    }

    /// Value stored for `(r, u)`. Requires `r ⊆ u`.
    #[inline]
    pub fn get(&self, r: Mask, u: Mask) -> &T {
        &self.rows[u as usize][Self::slot(r, u)]
    }

    /// Mutable access to the value stored for `(r, u)`. Requires `r ⊆ u`.
    #[inline]
    pub fn get_mut(&mut self, r: Mask, u: Mask) -> &mut T {
        &mut self.rows[u as usize][Self::slot(r, u)]
    }

    /// Store `value` for `(r, u)`. Requires `r ⊆ u`.
    #[inline]
    pub fn set(&mut self, r: Mask, u: Mask, value: T) {
        *self.get_mut(r, u) = value;
    }

    /// The dense row of superset `u`, indexed by compressed subset.
    pub fn row(&self, u: Mask) -> &[T] {
        &self.rows[u as usize]
    }
}

impl<T> Index<(Mask, Mask)> for SubsetTable<T> {
    type Output = T;

    fn index(&self, (r, u): (Mask, Mask)) -> &Self::Output {
        self.get(r, u)
    }
}

impl<T> IndexMut<(Mask, Mask)> for SubsetTable<T> {
    fn index_mut(&mut self, (r, u): (Mask, Mask)) -> &mut Self::Output {
        self.get_mut(r, u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::Submasks;

    #[test]
    fn test_subset_table_sizes() {
        let table: SubsetTable<u8> = SubsetTable::new(4);
        assert_eq!(table.num_nodes(), 4);
        assert_eq!(table.len(), 81); // 3^4
        assert_eq!(table.row(0).len(), 1);
        assert_eq!(table.row(0b1011).len(), 8);

        let empty: SubsetTable<u8> = SubsetTable::new(0);
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn test_subset_table_defaults() {
        let table: SubsetTable<i32> = SubsetTable::new(3);
        for u in 0..8 {
            assert_eq!(table[(0, u)], 0);
            for r in Submasks::new(u) {
                assert_eq!(table[(r, u)], 0);
            }
        }
    }

    #[test]
    fn test_subset_table_no_aliasing() {
        let n = 10;
        let mut table: SubsetTable<u64> = SubsetTable::new(n);
        let key = |r: u32, u: u32| ((u as u64) << 32) | r as u64;

        for u in 0..1u32 << n {
            table.set(0, u, key(0, u));
            for r in Submasks::new(u) {
                table.set(r, u, key(r, u));
            }
        }
        for u in 0..1u32 << n {
            assert_eq!(*table.get(0, u), key(0, u));
            for r in Submasks::new(u) {
                assert_eq!(*table.get(r, u), key(r, u));
            }
        }
    }

    #[test]
    fn test_subset_table_index_mut() {
        let mut table: SubsetTable<f64> = SubsetTable::new(3);
        table[(0b010, 0b110)] += 1.5;
        table[(0b010, 0b110)] += 1.5;
        assert_eq!(table[(0b010, 0b110)], 3.0);
        assert_eq!(table[(0b100, 0b110)], 0.0);
        assert_eq!(table[(0b010, 0b010)], 0.0);
    }

    #[test]
    #[should_panic(expected = "SubsetTable supports at most 30 nodes")]
    fn test_subset_table_too_large() {
        let _table: SubsetTable<u8> = SubsetTable::new(31);
    }
}
