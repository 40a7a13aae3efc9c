// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The Chernikova-style conversion step: fold one new row of a primary
//! system (constraints or generators) into the dual system, updating the
//! saturation matrix as it goes.
//!
//! This is the textbook double-description update (Fukuda & Prodon's
//! incremental algorithm): partition the dual rows by the sign of their
//! scalar product with the new row, drop the ones on the wrong side, and
//! patch the gap they leave with the *adjacent* combinations of a kept row
//! and a dropped one. Bidirectional rows (lines when the dual holds
//! generators, equalities when it holds constraints) are handled first by
//! pivoting, and a bidirectional *new* row additionally collapses both
//! strict sides of the partition.
//!
//! Strict inequalities need no special casing here: they enter as
//! non-strict rows over the epsilon-extended column vector, and the scalar
//! products below run over the full vector, epsilon included.

use crate::bitset::{Bitset, BitsetMatrix};
use crate::row::{Row, RowKind};

/// What happened when a single new row was folded into the dual system.
#[derive(Debug, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The new row was implied by the dual system as it stood; the dual
    /// system did not change.
    Redundant,
    /// The new row cut away part of the dual system; it has been updated
    /// in place.
    Updated,
    /// The new row is incompatible with every dual row: nothing of the dual
    /// system survives, so the represented polyhedron is empty.
    Empties,
}

/// Partition of dual-row indices by the sign of their scalar product with
/// the new row.
struct Signs {
    zero: Vec<usize>,
    positive: Vec<usize>,
    negative: Vec<usize>,
}

fn classify(new_row: &Row, dual: &[Row]) -> Signs {
    let mut s = Signs {
        zero: Vec::new(),
        positive: Vec::new(),
        negative: Vec::new(),
    };
    for (i, d) in dual.iter().enumerate() {
        let sp = new_row.scalar_product(d);
        if sp.is_zero() {
            s.zero.push(i);
        } else if sp.is_positive() {
            s.positive.push(i);
        } else {
            s.negative.push(i);
        }
    }
    s
}

/// The adjacency test of the double-description method: `p` and `n`
/// combine into a new dual row iff no third dual row saturates every
/// constraint both `p` and `n` saturate. Combinations failing this test
/// would only ever be redundant faces, so skipping them keeps the dual
/// system close to minimal without a separate simplification pass after
/// every step. Bidirectional rows are not eligible third parties: they
/// saturate everything and would veto every pair.
fn are_adjacent(p: usize, n: usize, sat: &BitsetMatrix, dual: &[Row]) -> bool {
    if sat.ncols() == 0 {
        // No primary row has been processed yet: there is nothing for a
        // third dual row to disagree on, so every pair is adjacent.
        return true;
    }
    let common = sat.row(p) & sat.row(n);
    dual.iter().enumerate().all(|(g, row)| {
        g == p || g == n || row.kind().is_line_or_equality() || !common.is_subset_of(sat.row(g))
    })
}

/// The kind a bidirectional dual row settles into once one of its two
/// directions has been cut away by a new row: a line becomes a ray, an
/// equality becomes a non-strict inequality.
fn kind_after_elimination(kind: RowKind) -> RowKind {
    match kind {
        RowKind::Line => RowKind::Ray,
        RowKind::Equality => RowKind::NonStrictInequality,
        other => other,
    }
}

/// A pairwise combination inherits the kind of the row it was built from,
/// which is wrong when a point and a ray meet: the divisor decides. Only
/// the coarse point/ray split matters here; the caller refines points
/// into closure points from the epsilon coordinate once all rows are in.
fn settle_combo_kind(row: &mut Row) {
    if row.kind().is_generator_kind() {
        if row.coeff(0).is_positive() {
            row.set_kind(RowKind::Point);
        } else {
            row.set_kind(RowKind::Ray);
        }
    }
}

/// Bidirectional elimination: when a line (or equality) of the dual system
/// has a non-zero scalar product with `new_row`, the positive/negative
/// partition does not apply to it. Instead it serves as a pivot: every
/// other dual row absorbs a multiple of it so that its own scalar product
/// drops to zero. The pivot itself is then either collapsed to the one
/// direction that satisfies `new_row` (when `new_row` admits a satisfied
/// side) or, when `new_row` is itself bidirectional, removed outright: a
/// free direction crossing a hyperplane contributes nothing inside it.
fn eliminate_via_bidirectional(
    new_row: &Row,
    dual: &mut Vec<Row>,
    sat: &mut BitsetMatrix,
    pivot: usize,
) -> ConversionOutcome {
    // Orient the (bidirectional, hence freely negatable) pivot toward the
    // satisfied side, so every combination below carries a positive
    // multiple of the row it adjusts.
    let mut pivot_row = dual[pivot].clone();
    let mut sp0 = new_row.scalar_product(&pivot_row);
    if sp0.is_negative() {
        pivot_row.negate();
        sp0 = -sp0;
    }
    let pivot_sat = sat.row(pivot).clone();

    let mut new_dual = Vec::with_capacity(dual.len());
    let mut new_sats = Vec::with_capacity(dual.len());
    for i in 0..dual.len() {
        if i == pivot {
            continue;
        }
        let sp_i = new_row.scalar_product(&dual[i]);
        if sp_i.is_zero() {
            new_dual.push(dual[i].clone());
            new_sats.push(sat.row(i).clone());
        } else {
            new_dual.push(dual[i].combine_on_values(&pivot_row, &sp_i, &sp0));
            new_sats.push(sat.row(i) & &pivot_sat);
        }
    }

    if !new_row.kind().is_line_or_equality() {
        pivot_row.set_kind(kind_after_elimination(pivot_row.kind()));
        new_dual.push(pivot_row);
        new_sats.push(pivot_sat);
    }

    if new_dual.is_empty() {
        return ConversionOutcome::Empties;
    }

    *dual = new_dual;
    let ncols = sat.ncols();
    let mut rebuilt = BitsetMatrix::new(ncols);
    for row in new_sats {
        rebuilt.push_row_with(row);
    }
    *sat = rebuilt;
    ConversionOutcome::Updated
}

/// Fold `new_row` into `dual`, keeping `sat` (one bitset per dual row, a
/// set bit meaning the dual row saturates that primary row; not yet
/// counting `new_row` itself) in sync. On return, `dual` and `sat`
/// describe the dual system once `new_row` has joined the primary system;
/// `sat`'s columns still refer to the old primary rows only — the caller
/// appends the column for `new_row` once it has been appended to the
/// primary system.
pub fn convert_row(new_row: &Row, dual: &mut Vec<Row>, sat: &mut BitsetMatrix) -> ConversionOutcome {
    if let Some(pivot) = dual
        .iter()
        .position(|r| r.kind().is_line_or_equality() && !new_row.scalar_product(r).is_zero())
    {
        return eliminate_via_bidirectional(new_row, dual, sat, pivot);
    }

    let signs = classify(new_row, dual);
    let bidirectional = new_row.kind().is_line_or_equality();

    if signs.negative.is_empty() && (!bidirectional || signs.positive.is_empty()) {
        return ConversionOutcome::Redundant;
    }

    let mut combined_rows = Vec::new();
    let mut combined_sats = Vec::new();
    for &p in &signs.positive {
        for &n in &signs.negative {
            if are_adjacent(p, n, sat, dual) {
                let sp_p = new_row.scalar_product(&dual[p]);
                let sp_n = new_row.scalar_product(&dual[n]);
                // `(sp_p/g)*n - (sp_n/g)*p` is the positive combination of
                // the two parents that lands exactly on the new boundary.
                let mut combo = dual[n].combine_on_values(&dual[p], &sp_n, &sp_p);
                settle_combo_kind(&mut combo);
                combined_rows.push(combo);
                combined_sats.push(sat.row(p) & sat.row(n));
            }
        }
    }

    // A bidirectional new row collapses both strict sides; an inequality
    // keeps the side that satisfies it.
    let mut keep: Vec<usize> = signs.zero;
    if !bidirectional {
        keep.extend(signs.positive);
        keep.sort_unstable();
    }

    if keep.is_empty() && combined_rows.is_empty() {
        return ConversionOutcome::Empties;
    }

    let kept_rows: Vec<Row> = keep.iter().map(|&i| dual[i].clone()).collect();
    let kept_sats: Vec<Bitset> = keep.iter().map(|&i| sat.row(i).clone()).collect();

    dual.clear();
    dual.extend(kept_rows);
    dual.extend(combined_rows);

    let ncols = sat.ncols();
    let mut new_sat = BitsetMatrix::new(ncols);
    for row in kept_sats.into_iter().chain(combined_sats) {
        new_sat.push_row_with(row);
    }
    *sat = new_sat;

    ConversionOutcome::Updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigint::Coefficient;
    use crate::row::{RowKind, Topology};

    fn point(coeffs: &[i64]) -> Row {
        Row::new(
            RowKind::Point,
            Topology::Closed,
            coeffs.iter().map(|&c| Coefficient::from_i64(c)).collect(),
        )
    }

    fn constraint(kind: RowKind, coeffs: &[i64]) -> Row {
        Row::new(
            kind,
            Topology::Closed,
            coeffs.iter().map(|&c| Coefficient::from_i64(c)).collect(),
        )
    }

    // A unit square [0,1]x[0,1], generators as the four corner points,
    // against no constraints yet (sat has zero columns).
    fn square() -> (Vec<Row>, BitsetMatrix) {
        let gens = vec![
            point(&[1, 0, 0]),
            point(&[1, 1, 0]),
            point(&[1, 0, 1]),
            point(&[1, 1, 1]),
        ];
        let mut sat = BitsetMatrix::new(0);
        for _ in &gens {
            sat.push_row();
        }
        (gens, sat)
    }

    #[test]
    fn cutting_the_square_keeps_the_far_side_and_drops_the_near_one() {
        let (mut gens, mut sat) = square();
        // x >= 1/2, scaled: 2x - 1 >= 0.
        let c = constraint(RowKind::NonStrictInequality, &[-1, 2, 0]);
        let outcome = convert_row(&c, &mut gens, &mut sat);
        assert_eq!(outcome, ConversionOutcome::Updated);
        // the two points with x=0 violate c and are gone; the two points
        // with x=1 satisfy it and survive.
        let surviving_x1 = gens
            .iter()
            .filter(|g| *g.coeff(0) == Coefficient::one() && *g.coeff(1) == Coefficient::one())
            .count();
        assert_eq!(surviving_x1, 2);
        // at least one new point sits exactly on the cut x = 1/2.
        assert!(gens.iter().any(|g| {
            let divisor = g.coeff(0);
            let x = g.coeff(1);
            !divisor.is_zero() && &(x + x) == divisor
        }));
    }

    #[test]
    fn an_equality_collapses_both_strict_sides() {
        let (mut gens, mut sat) = square();
        // x = 0: only the two corners on the y axis survive.
        let c = constraint(RowKind::Equality, &[0, 1, 0]);
        let outcome = convert_row(&c, &mut gens, &mut sat);
        assert_eq!(outcome, ConversionOutcome::Updated);
        assert!(gens.iter().all(|g| g.coeff(1).is_zero()));
        assert_eq!(gens.len(), 2);
    }

    #[test]
    fn an_equality_through_a_line_drops_the_line() {
        // The whole plane: a point at the origin plus two lines.
        let mut gens = vec![
            point(&[1, 0, 0]),
            Row::new(
                RowKind::Line,
                Topology::Closed,
                vec![Coefficient::zero(), Coefficient::one(), Coefficient::zero()],
            ),
            Row::new(
                RowKind::Line,
                Topology::Closed,
                vec![Coefficient::zero(), Coefficient::zero(), Coefficient::one()],
            ),
        ];
        let mut sat = BitsetMatrix::new(0);
        for _ in &gens {
            sat.push_row();
        }
        // x = 3 moves the point and consumes the x line.
        let c = constraint(RowKind::Equality, &[-3, 1, 0]);
        let outcome = convert_row(&c, &mut gens, &mut sat);
        assert_eq!(outcome, ConversionOutcome::Updated);
        assert_eq!(gens.len(), 2);
        let moved = gens
            .iter()
            .find(|g| g.kind() == RowKind::Point)
            .expect("the point survives");
        assert_eq!(*moved.coeff(1), Coefficient::from_i64(3));
        assert_eq!(gens.iter().filter(|g| g.kind() == RowKind::Line).count(), 1);
    }

    #[test]
    fn a_cut_through_a_cone_builds_the_boundary_ray() {
        // The cone spanned by the x and y axis rays, cut with x - y >= 0:
        // the y ray goes, the bisector ray x = y appears.
        let ray = |coeffs: &[i64]| {
            Row::new(
                RowKind::Ray,
                Topology::Closed,
                coeffs.iter().map(|&c| Coefficient::from_i64(c)).collect(),
            )
        };
        let mut gens = vec![point(&[1, 0, 0]), ray(&[0, 1, 0]), ray(&[0, 0, 1])];
        let mut sat = BitsetMatrix::new(0);
        for _ in &gens {
            sat.push_row();
        }
        let c = constraint(RowKind::NonStrictInequality, &[0, 1, -1]);
        let outcome = convert_row(&c, &mut gens, &mut sat);
        assert_eq!(outcome, ConversionOutcome::Updated);
        assert!(gens.iter().any(|g| g.kind() == RowKind::Ray
            && g.coeff(0).is_zero()
            && *g.coeff(1) == Coefficient::one()
            && *g.coeff(2) == Coefficient::one()));
        // no generator may point out of the half-space x >= y
        assert!(gens.iter().all(|g| !c.scalar_product(g).is_negative()));
    }

    #[test]
    fn a_constraint_satisfied_everywhere_is_redundant() {
        let (mut gens, mut sat) = square();
        let c = constraint(RowKind::NonStrictInequality, &[1, 0, 0]); // 1 >= 0
        let before = gens.len();
        let outcome = convert_row(&c, &mut gens, &mut sat);
        assert_eq!(outcome, ConversionOutcome::Redundant);
        assert_eq!(gens.len(), before);
    }

    #[test]
    fn a_constraint_violated_everywhere_empties_the_system() {
        let (mut gens, mut sat) = square();
        let c = constraint(RowKind::NonStrictInequality, &[-5, 0, 0]); // -5 >= 0
        let outcome = convert_row(&c, &mut gens, &mut sat);
        assert_eq!(outcome, ConversionOutcome::Empties);
    }
}
