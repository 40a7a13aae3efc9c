// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A [`Matrix`] specialised to linear (in)equations or generators: carries
//! a [`Topology`] tag and the normalisation conventions spec.md §3
//! requires (spec.md §4.2).

use crate::matrix::Matrix;
use crate::row::{Row, Topology};

/// A [`Matrix`] of rows that all share one [`Topology`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearSystem {
    matrix: Matrix,
    topology: Topology,
}

impl LinearSystem {
    /// An empty system of `space_dim + 1` homogeneous columns (`+1` for
    /// epsilon, iff `topology` is NNC).
    pub fn new(space_dim: usize, topology: Topology) -> Self {
        let ncols = space_dim + 1 + topology.is_nnc() as usize;
        LinearSystem {
            matrix: Matrix::new(ncols),
            topology,
        }
    }

    /// Wrap an already-built [`Matrix`]; `topology` must match every row's
    /// own topology.
    pub fn from_matrix(matrix: Matrix, topology: Topology) -> Self {
        LinearSystem { matrix, topology }
    }

    /// This system's topology.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// The space dimension: the number of homogeneous coordinates, i.e.
    /// columns minus 1 (for the leading column) minus 1 more if NNC (for
    /// epsilon).
    pub fn space_dimension(&self) -> usize {
        self.matrix.ncols() - 1 - self.topology.is_nnc() as usize
    }

    /// Immutable access to the underlying matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Mutable access to the underlying matrix.
    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    /// `true` iff there are no rows.
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Insert `row`, promoting it to this system's topology first if it
    /// arrives from a closed context while this system is NNC (the
    /// epsilon-column promotion per §3), and padding its homogeneous part
    /// with zeros when it was built over fewer dimensions than this system
    /// spans. A row mentioning more dimensions than the system widens the
    /// system instead.
    pub fn insert(&mut self, mut row: Row) {
        self.align(&mut row);
        self.matrix.insert(row);
    }

    /// As [`LinearSystem::insert`], but always pending.
    pub fn insert_pending(&mut self, mut row: Row) {
        self.align(&mut row);
        self.matrix.insert_pending(row);
    }

    fn align(&mut self, row: &mut Row) {
        if self.topology.is_nnc() && !row.topology().is_nnc() {
            row.promote_to_nnc();
        }
        assert_eq!(row.topology(), self.topology, "row topology does not match the system's");
        let row_dim = row.len() - 1 - row.topology().is_nnc() as usize;
        let sys_dim = self.space_dimension();
        if row_dim < sys_dim {
            row.add_zero_columns(sys_dim - row_dim);
        } else if row_dim > sys_dim {
            self.matrix.add_zero_columns(row_dim - sys_dim);
        }
    }

    /// Grow the column count to `new_dim` and add/drop the epsilon column
    /// for a transition to `new_topology`. Returns `false` without
    /// modifying `self` when the transition from NNC to closed is
    /// impossible because a generator system contains an unmatched closure
    /// point (spec.md §4.2); all other transitions always succeed.
    ///
    /// `is_generator_system_with_unmatched_closure_point` lets the caller
    /// (which knows whether this system is a generator system, and can
    /// check the closure-point/point pairing invariant) supply the one
    /// piece of information this method cannot derive from the matrix
    /// alone.
    pub fn adjust_topology_and_space_dimension(
        &mut self,
        new_topology: Topology,
        new_dim: usize,
        closing_would_lose_closure_points: bool,
    ) -> bool {
        if self.topology.is_nnc() && !new_topology.is_nnc() && closing_would_lose_closure_points {
            return false;
        }
        let old_dim = self.space_dimension();
        if new_dim > old_dim {
            self.matrix.add_zero_columns(new_dim - old_dim);
        } else if new_dim < old_dim {
            self.matrix.remove_trailing_columns(old_dim - new_dim);
        }
        match (self.topology.is_nnc(), new_topology.is_nnc()) {
            (false, true) => {
                for r in 0..self.matrix.nrows() {
                    self.matrix.row_mut(r).promote_to_nnc();
                }
                self.matrix = Matrix::from_rows(
                    self.matrix.ncols() + 1,
                    (0..self.matrix.nrows())
                        .map(|i| self.matrix.row(i).clone())
                        .collect(),
                    self.matrix.is_sorted(),
                );
            }
            (true, false) => {
                for r in 0..self.matrix.nrows() {
                    self.matrix.row_mut(r).demote_to_closed();
                }
                self.matrix = Matrix::from_rows(
                    self.matrix.ncols() - 1,
                    (0..self.matrix.nrows())
                        .map(|i| self.matrix.row(i).clone())
                        .collect(),
                    self.matrix.is_sorted(),
                );
            }
            _ => {}
        }
        self.topology = new_topology;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::Coefficient;
    use crate::row::RowKind;

    fn row(kind: RowKind, topology: Topology, coeffs: &[i64]) -> Row {
        Row::new(
            kind,
            topology,
            coeffs.iter().map(|&c| Coefficient::from_i64(c)).collect(),
        )
    }

    #[test]
    fn insert_promotes_closed_row_into_nnc_system() {
        let mut s = LinearSystem::new(1, Topology::Nnc);
        s.insert(row(RowKind::NonStrictInequality, Topology::Closed, &[0, 1]));
        assert_eq!(s.matrix().row(0).len(), 3);
    }

    #[test]
    fn adjust_topology_grows_and_shrinks_epsilon_column() {
        let mut s = LinearSystem::new(1, Topology::Closed);
        s.insert(row(RowKind::NonStrictInequality, Topology::Closed, &[0, 1]));
        assert!(s.adjust_topology_and_space_dimension(Topology::Nnc, 1, false));
        assert_eq!(s.matrix().ncols(), 3);
        assert!(s.adjust_topology_and_space_dimension(Topology::Closed, 1, false));
        assert_eq!(s.matrix().ncols(), 2);
    }

    #[test]
    fn adjust_topology_refuses_to_drop_unmatched_closure_points() {
        let mut s = LinearSystem::new(1, Topology::Nnc);
        s.insert(row(RowKind::ClosurePoint, Topology::Nnc, &[1, 0, 0]));
        assert!(!s.adjust_topology_and_space_dimension(Topology::Closed, 1, true));
        assert!(s.topology().is_nnc());
    }
}
