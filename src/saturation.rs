// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The saturation relation between a constraint system and a generator
//! system, kept in both orientations (spec.md §4.3).

use crate::bitset::{Bitset, BitsetMatrix};
use crate::row::Row;

/// Which orientation a [`SaturationMatrix`] is indexed in: one bitset per
/// constraint (bits over generators) or one bitset per generator (bits
/// over constraints).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Row `i` is constraint `i`; bit `j` says generator `j` saturates it.
    RowsAreConstraints,
    /// Row `i` is generator `i`; bit `j` says it saturates constraint `j`.
    RowsAreGenerators,
}

/// The saturation relation `sat(c, g) = 1` iff `c · g = 0`, stored densely
/// in one orientation. A [`crate::polyhedron::Polyhedron`] keeps both
/// orientations (`sat_c`, `sat_g`) as exact transposes of each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaturationMatrix {
    bits: BitsetMatrix,
    orientation: Orientation,
}

impl SaturationMatrix {
    /// An empty saturation matrix with `ncols` bits per row.
    pub fn new(orientation: Orientation, ncols: usize) -> Self {
        SaturationMatrix {
            bits: BitsetMatrix::new(ncols),
            orientation,
        }
    }

    /// Build by computing, for every row of `primary` against every row of
    /// `dual`, whether their scalar product vanishes. Both systems belong
    /// to one polyhedron and share its topology, so the product runs over
    /// the full coefficient vector, epsilon included. `orientation`
    /// describes which of the two systems indexes rows.
    pub fn build(primary: &[Row], dual: &[Row], orientation: Orientation) -> Self {
        let mut m = SaturationMatrix::new(orientation, dual.len());
        for p in primary {
            m.bits.push_row();
            let i = m.bits.nrows() - 1;
            for (j, d) in dual.iter().enumerate() {
                if p.scalar_product(d).is_zero() {
                    m.bits.set(i, j);
                }
            }
        }
        m
    }

    /// This matrix's orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of rows (constraints if [`Orientation::RowsAreConstraints`],
    /// generators otherwise).
    pub fn nrows(&self) -> usize {
        self.bits.nrows()
    }

    /// Number of columns (the dual dimension to [`SaturationMatrix::nrows`]).
    pub fn ncols(&self) -> usize {
        self.bits.ncols()
    }

    /// The saturation bitset for row `i`.
    pub fn row(&self, i: usize) -> &Bitset {
        self.bits.row(i)
    }

    /// Mutable access to the saturation bitset for row `i`.
    pub fn row_mut(&mut self, i: usize) -> &mut Bitset {
        self.bits.row_mut(i)
    }

    /// `true` iff row `i` saturates column `j`.
    pub fn test(&self, i: usize, j: usize) -> bool {
        self.bits.test(i, j)
    }

    /// Append an all-clear row (a newly inserted constraint/generator with
    /// unknown saturation, to be filled in before use).
    pub fn push_row(&mut self) {
        self.bits.push_row();
    }

    /// Append `row` verbatim.
    pub fn push_row_with(&mut self, row: Bitset) {
        self.bits.push_row_with(row);
    }

    /// Remove row `i`.
    pub fn remove_row(&mut self, i: usize) {
        self.bits.remove_row(i);
    }

    /// Append an all-clear column (a newly inserted dual row).
    pub fn push_column(&mut self) {
        self.bits.push_column();
    }

    /// Remove column `j`.
    pub fn remove_column(&mut self, j: usize) {
        self.bits.remove_column(j);
    }

    /// Transpose this matrix, swapping its orientation. Used to regenerate
    /// `sat_g` from `sat_c` (or vice versa) rather than recomputing scalar
    /// products from scratch.
    pub fn transpose(&self) -> SaturationMatrix {
        let orientation = match self.orientation {
            Orientation::RowsAreConstraints => Orientation::RowsAreGenerators,
            Orientation::RowsAreGenerators => Orientation::RowsAreConstraints,
        };
        SaturationMatrix {
            bits: self.bits.transpose(),
            orientation,
        }
    }

    /// Swap rows `i` and `j` (used when a generator/constraint system is
    /// re-sorted).
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.bits.swap_rows(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::Coefficient;
    use crate::row::{RowKind, Topology};

    fn row(kind: RowKind, coeffs: &[i64]) -> Row {
        Row::new(
            kind,
            Topology::Closed,
            coeffs.iter().map(|&c| Coefficient::from_i64(c)).collect(),
        )
    }

    #[test]
    fn build_marks_orthogonal_pairs() {
        let constraints = vec![row(RowKind::NonStrictInequality, &[0, 1, 0])];
        let generators = vec![
            row(RowKind::Point, &[1, 0, 0]),
            row(RowKind::Point, &[1, 5, 0]),
        ];
        let sat = SaturationMatrix::build(&constraints, &generators, Orientation::RowsAreConstraints);
        assert!(sat.test(0, 0));
        assert!(!sat.test(0, 1));
    }

    #[test]
    fn transpose_swaps_orientation_and_dimensions() {
        let constraints = vec![row(RowKind::NonStrictInequality, &[0, 1, 0])];
        let generators = vec![row(RowKind::Point, &[1, 0, 0])];
        let sat = SaturationMatrix::build(&constraints, &generators, Orientation::RowsAreConstraints);
        let t = sat.transpose();
        assert_eq!(t.orientation(), Orientation::RowsAreGenerators);
        assert_eq!(t.nrows(), 1);
        assert_eq!(t.ncols(), 1);
        assert!(t.test(0, 0));
    }
}
