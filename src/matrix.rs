// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A growable container of [`Row`]s sharing a uniform column count, with
//! sortedness tracking, a pending-rows split point, and the column
//! operations dimension/topology changes need (spec.md §4.2).

use crate::row::Row;

/// A matrix of rows of identical length.
///
/// Rows before [`Matrix::first_pending`] form the *active* prefix and, when
/// [`Matrix::is_sorted`] is set, are sorted by [`Row::sort_key_cmp`]. Rows
/// from the cursor onward are *pending*: appended but not yet incorporated
/// into minimisation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    rows: Vec<Row>,
    ncols: usize,
    sorted: bool,
    first_pending: usize,
}

impl Matrix {
    /// An empty matrix with `ncols` columns.
    pub fn new(ncols: usize) -> Self {
        Matrix {
            rows: Vec::new(),
            ncols,
            sorted: true,
            first_pending: 0,
        }
    }

    /// Build a matrix from rows that are already known to be active
    /// (non-pending) and, if `sorted` is asserted by the caller, already in
    /// sort order.
    pub fn from_rows(ncols: usize, rows: Vec<Row>, sorted: bool) -> Self {
        let n = rows.len();
        Matrix {
            rows,
            ncols,
            sorted,
            first_pending: n,
        }
    }

    /// Number of rows, active and pending together.
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns every row has.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `true` iff there are no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first pending row; rows `[0, first_pending())` are
    /// active.
    pub fn first_pending(&self) -> usize {
        self.first_pending
    }

    /// `true` iff there is at least one pending row.
    pub fn has_pending(&self) -> bool {
        self.first_pending < self.rows.len()
    }

    /// `true` iff the active prefix is known to be sorted.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Access row `i`.
    pub fn row(&self, i: usize) -> &Row {
        &self.rows[i]
    }

    /// Mutable access to row `i`.
    pub fn row_mut(&mut self, i: usize) -> &mut Row {
        &mut self.rows[i]
    }

    /// Iterate over the active rows only.
    pub fn active_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows[..self.first_pending].iter()
    }

    /// Iterate over the pending rows only.
    pub fn pending_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows[self.first_pending..].iter()
    }

    /// Iterate over all rows, active then pending.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Insert `row` as specified by spec.md §4.2's `insert`: when no
    /// pending rows exist, append and clear the sorted bit (the new row is
    /// not known to respect sort order); when pending rows already exist,
    /// appending preserves the existing cursor (the row becomes pending
    /// too, which is the same as `insert_pending` in that case).
    pub fn insert(&mut self, row: Row) {
        if self.has_pending() {
            self.insert_pending(row);
        } else {
            self.rows.push(row);
            self.first_pending = self.rows.len();
            self.sorted = false;
        }
    }

    /// Append `row` beyond the cursor: it becomes pending, and the sorted
    /// bit — which only describes the active prefix — is unaffected.
    pub fn insert_pending(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Insert `row` into the active prefix keeping it sorted, used when
    /// there is no pending backlog and the caller wants to skip a later
    /// explicit sort. No-op-equivalent to `insert` followed by
    /// `sort_rows` when there is no pending backlog; panics if called
    /// while pending rows exist or the matrix isn't already sorted.
    pub fn insert_sorted(&mut self, row: Row) {
        assert!(!self.has_pending());
        assert!(self.sorted);
        let pos = self.rows.partition_point(|r| r.sort_key_cmp(&row) == std::cmp::Ordering::Less);
        self.rows.insert(pos, row);
        self.first_pending = self.rows.len();
    }

    /// Mark every row active (clears the pending backlog without changing
    /// row content) — called once pending rows have been folded into the
    /// dual system and no longer need special treatment.
    pub fn clear_pending(&mut self) {
        self.first_pending = self.rows.len();
    }

    /// Take the pending rows out, leaving only the active prefix behind.
    /// Used by `process_pending_*` to hand the backlog to conversion.
    pub fn take_pending(&mut self) -> Vec<Row> {
        self.rows.split_off(self.first_pending)
    }

    /// Remove the rows at the given (sorted, ascending) indices.
    pub fn remove_rows(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable();
        indices.dedup();
        for &i in indices.iter().rev() {
            self.rows.remove(i);
            if i < self.first_pending {
                self.first_pending -= 1;
            }
        }
    }

    /// Append `n` zero columns to every row (spec.md §4.2).
    pub fn add_zero_columns(&mut self, n: usize) {
        self.ncols += n;
        for r in &mut self.rows {
            r.add_zero_columns(n);
        }
    }

    /// Remove the last `n` homogeneous columns from every row.
    pub fn remove_trailing_columns(&mut self, n: usize) {
        self.ncols -= n;
        for r in &mut self.rows {
            r.remove_trailing_columns(n);
        }
    }

    /// Remove the columns at the given indices from every row,
    /// re-normalising the survivors. Used when projecting space dimensions
    /// away.
    pub fn remove_columns(&mut self, cols: &[usize]) {
        let mut cols = cols.to_vec();
        cols.sort_unstable();
        cols.dedup();
        for r in &mut self.rows {
            for &c in cols.iter().rev() {
                r.coefficients_mut().remove(c);
            }
            r.strong_normalize();
        }
        self.ncols -= cols.len();
        self.sorted = false;
    }

    /// Swap columns `i` and `j` in every row, re-normalising each row
    /// afterward (swapping coordinates never changes the gcd of the
    /// coefficients, but it can change the sign convention since a
    /// line/equality row's "first non-zero after position 0" may move).
    pub fn swap_columns(&mut self, i: usize, j: usize) {
        for r in &mut self.rows {
            r.swap_columns(i, j);
            r.strong_normalize();
        }
        self.sorted = false;
    }

    /// Apply a permutation of columns described as a list of disjoint
    /// cycles, each cycle a sequence of column indices to rotate. Used by
    /// `map_space_dimensions` for a total permutation of dimensions.
    pub fn permute_columns(&mut self, cycles: &[Vec<usize>]) {
        for cycle in cycles {
            if cycle.len() < 2 {
                continue;
            }
            // column `cycle[slot]` receives the values previously held by
            // `cycle[slot - 1]` (mod cycle.len()), i.e. the cycle rotates.
            let values: Vec<Vec<crate::bigint::Coefficient>> = cycle
                .iter()
                .map(|&col| self.rows.iter().map(|r| r.coeff(col).clone()).collect())
                .collect();
            for (row_idx, r) in self.rows.iter_mut().enumerate() {
                for (slot, &col) in cycle.iter().enumerate() {
                    let src = (slot + cycle.len() - 1) % cycle.len();
                    *r.coeff_mut(col) = values[src][row_idx].clone();
                }
            }
        }
        for r in &mut self.rows {
            r.strong_normalize();
        }
        self.sorted = false;
    }

    /// Stable sort of the active prefix by [`Row::sort_key_cmp`]; sets
    /// [`Matrix::is_sorted`] to `true` on completion. Pending rows are left
    /// where they are.
    pub fn sort_rows(&mut self) {
        self.rows[..self.first_pending].sort_by(|a, b| a.sort_key_cmp(b));
        self.sorted = true;
    }

    /// Remove every generator row whose coordinate 0 is zero (a line or
    /// ray) and whose homogeneous part is entirely zero — the degenerate
    /// zero-vector rows spec.md §4.2 says invalidate after an affine image
    /// with a non-invertible map.
    pub fn remove_invalid_lines_and_rays(&mut self) {
        let dead: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.coeff(0).is_zero() && r.all_homogeneous_terms_zero())
            .map(|(i, _)| i)
            .collect();
        self.remove_rows(dead);
    }
}
