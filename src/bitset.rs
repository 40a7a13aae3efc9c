// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Dense bitsets and bitset matrices used for the saturation relation
//! (spec.md §4.3).

use fixedbitset::FixedBitSet;
use std::ops::{BitAnd, BitOr};

/// A single dense bitset, one bit per row of the dual system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bitset(FixedBitSet);

impl Bitset {
    /// A bitset of `len` bits, all clear.
    pub fn new(len: usize) -> Self {
        Bitset(FixedBitSet::with_capacity(len))
    }

    /// Number of bits this set holds.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` iff this bitset holds no bits at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set bit `i`.
    pub fn set(&mut self, i: usize) {
        self.0.insert(i);
    }

    /// Clear bit `i`.
    pub fn clear(&mut self, i: usize) {
        self.0.set(i, false);
    }

    /// Test bit `i`.
    pub fn test(&self, i: usize) -> bool {
        self.0.contains(i)
    }

    /// Clear every bit.
    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.0.count_ones(..)
    }

    /// Grow this bitset to `new_len` bits, clearing the new bits.
    pub fn grow(&mut self, new_len: usize) {
        self.0.grow(new_len);
    }

    /// Remove bit at index `i`, shifting all higher bits down by one.
    pub fn remove_bit(&mut self, i: usize) {
        let len = self.0.len();
        for j in i..len - 1 {
            self.0.set(j, self.0.contains(j + 1));
        }
        self.0.grow(len - 1);
    }

    /// `true` iff `self` is a subset of `other` (every bit set in `self`
    /// is also set in `other`) — the adjacency/redundancy test of spec.md
    /// §4.4 and §4.5 is phrased in terms of this relation.
    pub fn is_subset_of(&self, other: &Bitset) -> bool {
        debug_assert_eq!(self.len(), other.len());
        self.0.is_subset(&other.0)
    }

    /// Iterate over the indices of set bits.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.ones()
    }
}

impl BitAnd for &Bitset {
    type Output = Bitset;
    fn bitand(self, rhs: Self) -> Bitset {
        Bitset(&self.0 & &rhs.0)
    }
}

impl BitOr for &Bitset {
    type Output = Bitset;
    fn bitor(self, rhs: Self) -> Bitset {
        Bitset(&self.0 | &rhs.0)
    }
}

/// A matrix of [`Bitset`] rows: the concrete storage behind
/// [`crate::saturation::SaturationMatrix`]'s two orientations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitsetMatrix {
    rows: Vec<Bitset>,
    ncols: usize,
}

impl BitsetMatrix {
    /// An empty matrix with `ncols` columns and no rows yet.
    pub fn new(ncols: usize) -> Self {
        BitsetMatrix {
            rows: Vec::new(),
            ncols,
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns every row has.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Append a new all-clear row.
    pub fn push_row(&mut self) {
        self.rows.push(Bitset::new(self.ncols));
    }

    /// Append `row` verbatim (must have `self.ncols()` bits).
    pub fn push_row_with(&mut self, row: Bitset) {
        debug_assert_eq!(row.len(), self.ncols);
        self.rows.push(row);
    }

    /// Remove the row at `index`.
    pub fn remove_row(&mut self, index: usize) {
        self.rows.remove(index);
    }

    /// Append a fresh all-clear column to every row.
    pub fn push_column(&mut self) {
        self.ncols += 1;
        for r in &mut self.rows {
            r.grow(self.ncols);
        }
    }

    /// Remove the column at `index` from every row.
    pub fn remove_column(&mut self, index: usize) {
        self.ncols -= 1;
        for r in &mut self.rows {
            r.remove_bit(index);
        }
    }

    /// Access row `i`.
    pub fn row(&self, i: usize) -> &Bitset {
        &self.rows[i]
    }

    /// Mutable access to row `i`.
    pub fn row_mut(&mut self, i: usize) -> &mut Bitset {
        &mut self.rows[i]
    }

    /// Swap rows `i` and `j`.
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    /// Set bit `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize) {
        self.rows[i].set(j);
    }

    /// Test bit `(i, j)`.
    pub fn test(&self, i: usize, j: usize) -> bool {
        self.rows[i].test(j)
    }

    /// Transpose: returns a matrix with `self.nrows()` columns and
    /// `self.ncols()` rows, where `(j, i)` is set iff `(i, j)` was set in
    /// `self`. Used to keep `sat_c`/`sat_g` in sync (spec.md §3, §4.3).
    pub fn transpose(&self) -> BitsetMatrix {
        let mut t = BitsetMatrix::new(self.nrows());
        for _ in 0..self.ncols {
            t.push_row();
        }
        for (i, row) in self.rows.iter().enumerate() {
            for j in row.iter_ones() {
                t.set(j, i);
            }
        }
        t
    }

    /// Iterate over all rows.
    pub fn rows(&self) -> impl Iterator<Item = &Bitset> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_relation() {
        let mut a = Bitset::new(4);
        a.set(1);
        let mut b = Bitset::new(4);
        b.set(1);
        b.set(2);
        assert!(a.is_subset_of(&b));
        assert!(!b.is_subset_of(&a));
    }

    #[test]
    fn transpose_round_trips() {
        let mut m = BitsetMatrix::new(3);
        m.push_row();
        m.push_row();
        m.set(0, 1);
        m.set(1, 2);
        let t = m.transpose();
        assert_eq!(t.nrows(), 3);
        assert_eq!(t.ncols(), 2);
        assert!(t.test(1, 0));
        assert!(t.test(2, 1));
        let tt = t.transpose();
        assert_eq!(tt, m);
    }

    #[test]
    fn remove_column_shifts_higher_bits_down() {
        let mut m = BitsetMatrix::new(3);
        m.push_row();
        m.set(0, 0);
        m.set(0, 2);
        m.remove_column(0);
        assert!(!m.test(0, 0));
        assert!(m.test(0, 1));
    }
}
