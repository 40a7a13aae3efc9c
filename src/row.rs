// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A single row of a [`crate::matrix::Matrix`]: a fixed-length vector of
//! [`Coefficient`]s plus a flag word.
//!
//! A row is kind-agnostic plumbing shared by constraints and generators
//! (spec.md §9: "replicate this with a tagged enum inside Row; do not
//! introduce a trait per kind"). [`crate::constraint::Constraint`] and
//! [`crate::generator::Generator`] are thin typed views constructed from a
//! `Row` once its kind is known to be settled.

use crate::bigint::Coefficient;
use std::cmp::Ordering;

/// Whether a system admits strict inequalities / closure points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum Topology {
    /// Only non-strict inequalities and points are admitted; there is no
    /// epsilon column.
    #[default]
    Closed,
    /// Strict inequalities and closure points are admitted via a trailing
    /// epsilon column.
    Nnc,
}

impl Topology {
    /// `true` for [`Topology::Nnc`].
    pub fn is_nnc(self) -> bool {
        matches!(self, Topology::Nnc)
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Closed => write!(f, "C"),
            Topology::Nnc => write!(f, "NNC"),
        }
    }
}

/// The row-kind bit: which of the two dual interpretations a row carries.
///
/// A constraint row is either an equality (kind-bit "line-or-equality") or
/// an inequality (kind-bit "ray-or-point-or-inequality"); a generator row is
/// either a line (kind-bit "line-or-equality") or a ray/point/closure-point
/// (kind-bit "ray-or-point-or-inequality"). The finer-grained distinction
/// (equality vs line, strict vs non-strict, ray vs point vs closure point)
/// is carried by [`RowKind`] itself rather than a second bit, since it is
/// needed for display/construction even though the conversion/simplify
/// algorithms only ever branch on the coarse line-or-equality bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum RowKind {
    /// Constraint: `lhs = 0`.
    Equality,
    /// Constraint: `lhs >= 0`.
    NonStrictInequality,
    /// Constraint: `lhs > 0`, represented with an epsilon coefficient of
    /// -1 in an NNC system.
    StrictInequality,
    /// Generator: a line (both directions of unboundedness).
    Line,
    /// Generator: a ray (one direction of unboundedness).
    Ray,
    /// Generator: a point.
    Point,
    /// Generator: a closure point (NNC only).
    ClosurePoint,
}

impl RowKind {
    /// `true` for [`RowKind::Equality`] and [`RowKind::Line`] — the
    /// "line-or-equality" coarse kind used for sorting and by conversion's
    /// `num_lines_or_equalities` bookkeeping.
    pub fn is_line_or_equality(self) -> bool {
        matches!(self, RowKind::Equality | RowKind::Line)
    }

    /// `true` for constraint kinds.
    pub fn is_constraint_kind(self) -> bool {
        matches!(
            self,
            RowKind::Equality | RowKind::NonStrictInequality | RowKind::StrictInequality
        )
    }

    /// `true` for generator kinds.
    pub fn is_generator_kind(self) -> bool {
        !self.is_constraint_kind()
    }
}

/// A single row: coefficients plus the bits spec.md §3 assigns to the flag
/// word (kind, topology, and the two validity sub-flags are represented
/// here simply as the settled [`RowKind`] and [`Topology`] — this crate
/// never leaves a row's kind interpretation ambiguous in storage, so the
/// "validity" sub-flags from the original design become unnecessary: a
/// `Row` is always either a fully-formed constraint row or a fully-formed
/// generator row, never a half-reshaped one in transit between the two).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    kind: RowKind,
    topology: Topology,
    coefficients: Vec<Coefficient>,
}

impl Row {
    /// Build a row from its kind, topology and coefficients. `coefficients`
    /// must already include the trailing epsilon column iff `topology` is
    /// [`Topology::Nnc`].
    pub fn new(kind: RowKind, topology: Topology, coefficients: Vec<Coefficient>) -> Self {
        Row {
            kind,
            topology,
            coefficients,
        }
    }

    /// Number of coefficients, including the epsilon column if present.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// `true` iff the row carries no coefficients at all (never valid in a
    /// live system, but useful as a placeholder during construction).
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// This row's kind.
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Set this row's kind in place (used by conversion step 2 to
    /// reclassify a line as a ray/point/inequality).
    pub fn set_kind(&mut self, kind: RowKind) {
        self.kind = kind;
    }

    /// This row's topology.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Index of the epsilon column, if this row's topology is NNC.
    pub fn epsilon_index(&self) -> Option<usize> {
        self.topology.is_nnc().then(|| self.coefficients.len() - 1)
    }

    /// Coefficient at `index` (position 0 is the inhomogeneous term for a
    /// constraint, the divisor for a generator).
    pub fn coeff(&self, index: usize) -> &Coefficient {
        &self.coefficients[index]
    }

    /// Mutable access to the coefficient at `index`.
    pub fn coeff_mut(&mut self, index: usize) -> &mut Coefficient {
        &mut self.coefficients[index]
    }

    /// All coefficients as a slice.
    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Mutable access to all coefficients.
    pub fn coefficients_mut(&mut self) -> &mut Vec<Coefficient> {
        &mut self.coefficients
    }

    /// The epsilon coefficient, or zero if this row's topology is closed.
    pub fn epsilon(&self) -> Coefficient {
        match self.epsilon_index() {
            Some(i) => self.coefficients[i].clone(),
            None => Coefficient::zero(),
        }
    }

    /// Append `n` zero coefficients just before the epsilon column (if
    /// any), i.e. grow the homogeneous part of the row.
    pub fn add_zero_columns(&mut self, n: usize) {
        let insert_at = match self.epsilon_index() {
            Some(i) => i,
            None => self.coefficients.len(),
        };
        for _ in 0..n {
            self.coefficients.insert(insert_at, Coefficient::zero());
        }
    }

    /// Remove the last `n` homogeneous columns (not counting epsilon).
    pub fn remove_trailing_columns(&mut self, n: usize) {
        let eps = self.epsilon_index();
        let eps_coeff = eps.map(|i| self.coefficients[i].clone());
        let new_len = self.coefficients.len() - n - eps.is_some() as usize;
        self.coefficients.truncate(new_len);
        if let Some(c) = eps_coeff {
            self.coefficients.push(c);
        }
    }

    /// Swap the coefficients stored at column indices `i` and `j` (indices
    /// are into the full coefficient vector, including column 0 and the
    /// epsilon column).
    pub fn swap_columns(&mut self, i: usize, j: usize) {
        self.coefficients.swap(i, j);
    }

    /// Promote this row to NNC topology by appending the epsilon column.
    /// Points get an epsilon equal to their divisor (a point of the
    /// polyhedron sits at full epsilon height); every other kind gets zero.
    /// No-op if already NNC.
    pub fn promote_to_nnc(&mut self) {
        if !self.topology.is_nnc() {
            let eps = if self.kind == RowKind::Point {
                self.coefficients[0].clone()
            } else {
                Coefficient::zero()
            };
            self.coefficients.push(eps);
            self.topology = Topology::Nnc;
        }
    }

    /// Drop the epsilon column, demoting this row to closed topology.
    /// Callers are responsible for having checked that doing so is sound
    /// (spec.md §4.2's `adjust_topology_and_space_dimension`).
    pub fn demote_to_closed(&mut self) {
        if self.topology.is_nnc() {
            self.coefficients.pop();
            self.topology = Topology::Closed;
        }
    }

    /// `true` iff every coefficient from index 1 up to (but excluding) the
    /// epsilon column is zero — i.e. the homogeneous part vanishes. Used to
    /// detect generator rows that degenerate to the zero vector after a
    /// non-invertible affine image, and constraints that degenerate to a
    /// tautology/contradiction.
    pub fn all_homogeneous_terms_zero(&self) -> bool {
        let end = self.epsilon_index().unwrap_or(self.coefficients.len());
        self.coefficients[1..end].iter().all(|c| c.is_zero())
    }

    /// Scalar product `self · other`, `Σ self[i] * other[i]`, over the full
    /// coefficient vectors including the epsilon column. Requires equal
    /// length.
    pub fn scalar_product(&self, other: &Row) -> Coefficient {
        debug_assert_eq!(self.len(), other.len());
        self.coefficients
            .iter()
            .zip(other.coefficients.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Scalar product treating the epsilon column as absent: used when
    /// `self` and `other` come from systems of differing topology and a
    /// genuine mismatch there would otherwise manufacture a spurious
    /// non-zero (spec.md §4.1).
    pub fn reduced_scalar_product(&self, other: &Row) -> Coefficient {
        let len = self.len().min(other.len());
        let end = len.min(
            self.epsilon_index().unwrap_or(usize::MAX).min(
                other.epsilon_index().unwrap_or(usize::MAX),
            ),
        );
        let end = end.min(len);
        self.coefficients[..end]
            .iter()
            .zip(other.coefficients[..end].iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Flip the sign of every coefficient. `sign_normalise` calls this when
    /// the leading non-zero coefficient after position 0 is negative.
    fn negate_all(&mut self) {
        for c in &mut self.coefficients {
            *c = -c.clone();
        }
    }

    /// Public entry point for [`Row::negate_all`]: flips the sign of every
    /// coefficient, leaving the point or direction represented unchanged.
    pub fn negate(&mut self) {
        self.negate_all();
    }

    /// For a line-or-equality row: negate the whole row if the first
    /// non-zero coefficient after position 0 is negative, establishing the
    /// sign convention spec.md §3 requires.
    pub fn sign_normalize(&mut self) {
        if !self.kind.is_line_or_equality() {
            return;
        }
        let end = self.epsilon_index().unwrap_or(self.coefficients.len());
        if let Some(c) = self.coefficients[1..end].iter().find(|c| !c.is_zero()) {
            if c.is_negative() {
                self.negate_all();
            }
        }
    }

    /// Divide every coefficient by the gcd of the non-zero coefficients
    /// (or leave unchanged if all coefficients are zero), then
    /// [`Row::sign_normalize`]. This is "strong normalisation" from
    /// spec.md §3.
    pub fn strong_normalize(&mut self) {
        let g = self
            .coefficients
            .iter()
            .filter(|c| !c.is_zero())
            .fold(Coefficient::zero(), |acc, c| acc.gcd(c));
        if !g.is_zero() && g != Coefficient::one() {
            for c in &mut self.coefficients {
                if !c.is_zero() {
                    *c = c.exact_div(&g);
                }
            }
        }
        self.sign_normalize();
    }

    /// Linear combination `self <- (other_val / g) * self - (self_val / g) *
    /// other`, with `g = gcd(self_val, other_val)`, followed by strong
    /// normalisation. The result's scalar product against any row for which
    /// `self_val`/`other_val` were the scalar products of `self`/`other` is
    /// guaranteed to be zero. The resulting row keeps `self`'s kind; a point
    /// or closure point whose divisor came out negative is negated back to
    /// the positive-divisor convention (the represented point is
    /// unaffected: negating both the divisor and the coordinates is a
    /// no-op on the point itself).
    pub fn combine_on_values(&self, other: &Row, self_val: &Coefficient, other_val: &Coefficient) -> Row {
        debug_assert_eq!(self.len(), other.len());
        let g = self_val.gcd(other_val);
        let self_factor = other_val.exact_div(&g);
        let other_factor = self_val.exact_div(&g);
        let coefficients = self
            .coefficients
            .iter()
            .zip(other.coefficients.iter())
            .map(|(a, b)| &(&self_factor * a) - &(&other_factor * b))
            .collect();
        let mut row = Row::new(self.kind, self.topology, coefficients);
        row.strong_normalize();
        if matches!(row.kind, RowKind::Point | RowKind::ClosurePoint) && row.coeff(0).is_negative() {
            row.negate_all();
        }
        row
    }

    /// [`Row::combine_on_values`] specialised to pivot on column `k` rather
    /// than externally-supplied scalar products: the classic conversion
    /// combine, `g = gcd(self[k], other[k])`. The result is guaranteed to
    /// have a zero at column `k`.
    pub fn combine(&self, other: &Row, k: usize) -> Row {
        self.combine_on_values(other, self.coeff(k), other.coeff(k))
    }

    /// The strict total order of spec.md §3: line-or-equality rows sort
    /// before ray/point/inequality rows; within a kind class, lexicographic
    /// on coordinates 1..k, then on coordinate 0.
    pub fn sort_key_cmp(&self, other: &Row) -> Ordering {
        let class_self = !self.kind.is_line_or_equality();
        let class_other = !other.kind.is_line_or_equality();
        class_self
            .cmp(&class_other)
            .then_with(|| self.coefficients[1..].cmp(&other.coefficients[1..]))
            .then_with(|| self.coefficients[0].cmp(&other.coefficients[0]))
    }

    /// Classifies how `self` and `other` differ, using the "1 if only
    /// coordinate 0 differs, 2 otherwise" convention callers use to detect
    /// parallelism: `0` if identical, `1` if they differ only in
    /// coordinate 0, `2` if they differ elsewhere too.
    pub fn difference_class(&self, other: &Row) -> u8 {
        if self.coefficients[1..] != other.coefficients[1..] {
            2
        } else if self.coefficients[0] != other.coefficients[0] {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: RowKind, coeffs: &[i64]) -> Row {
        Row::new(
            kind,
            Topology::Closed,
            coeffs.iter().map(|&c| Coefficient::from_i64(c)).collect(),
        )
    }

    #[test]
    fn strong_normalize_divides_by_gcd_and_fixes_sign() {
        let mut r = row(RowKind::Equality, &[0, -4, 6]);
        r.strong_normalize();
        assert_eq!(r.coefficients(), &[Coefficient::zero(), Coefficient::from_i64(2), Coefficient::from_i64(-3)]);
    }

    #[test]
    fn strong_normalize_leaves_all_zero_row_alone() {
        let mut r = row(RowKind::NonStrictInequality, &[0, 0, 0]);
        r.strong_normalize();
        assert!(r.coefficients().iter().all(|c| c.is_zero()));
    }

    #[test]
    fn scalar_product_matches_definition() {
        let a = row(RowKind::NonStrictInequality, &[1, 2, 3]);
        let b = row(RowKind::Point, &[1, 1, 1]);
        assert_eq!(a.scalar_product(&b), Coefficient::from_i64(6));
    }

    #[test]
    fn combine_zeroes_the_pivot_column() {
        let a = row(RowKind::NonStrictInequality, &[0, 1, 2]);
        let b = row(RowKind::NonStrictInequality, &[0, -1, 3]);
        let c = a.combine(&b, 1);
        assert!(c.coeff(1).is_zero());
    }

    #[test]
    fn all_homogeneous_terms_zero_detects_degenerate_rays() {
        let r = row(RowKind::Ray, &[0, 0, 0]);
        assert!(r.all_homogeneous_terms_zero());
        let r2 = row(RowKind::Ray, &[0, 1, 0]);
        assert!(!r2.all_homogeneous_terms_zero());
    }

    #[test]
    fn sort_key_places_equalities_before_inequalities() {
        let eq = row(RowKind::Equality, &[0, 1, 0]);
        let ineq = row(RowKind::NonStrictInequality, &[0, 0, 1]);
        assert_eq!(eq.sort_key_cmp(&ineq), Ordering::Less);
    }

    #[test]
    fn reduced_scalar_product_ignores_epsilon_mismatch() {
        let a = Row::new(
            RowKind::NonStrictInequality,
            Topology::Nnc,
            vec![Coefficient::zero(), Coefficient::from_i64(1), Coefficient::from_i64(-1)],
        );
        let b = row(RowKind::Point, &[1, 5]);
        assert_eq!(a.reduced_scalar_product(&b), Coefficient::from_i64(5));
    }
}
