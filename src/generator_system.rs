// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A typed view of a [`LinearSystem`] whose rows are all [`Generator`]s.

use crate::bigint::Coefficient;
use crate::generator::Generator;
use crate::linear_system::LinearSystem;
use crate::row::{Row, RowKind, Topology};

/// A set of generators (lines, rays, points, closure points) sharing one
/// topology and space dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorSystem(LinearSystem);

impl GeneratorSystem {
    /// An empty system over `space_dim` dimensions.
    pub fn new(space_dim: usize, topology: Topology) -> Self {
        GeneratorSystem(LinearSystem::new(space_dim, topology))
    }

    /// Wrap an existing [`LinearSystem`] known to hold only generator rows.
    pub fn from_linear_system(system: LinearSystem) -> Self {
        GeneratorSystem(system)
    }

    /// Unwrap into the underlying [`LinearSystem`].
    pub fn into_linear_system(self) -> LinearSystem {
        self.0
    }

    /// Borrow the underlying [`LinearSystem`].
    pub fn linear_system(&self) -> &LinearSystem {
        &self.0
    }

    /// Mutably borrow the underlying [`LinearSystem`].
    pub fn linear_system_mut(&mut self) -> &mut LinearSystem {
        &mut self.0
    }

    /// This system's topology.
    pub fn topology(&self) -> Topology {
        self.0.topology()
    }

    /// The space dimension every generator is stated over.
    pub fn space_dimension(&self) -> usize {
        self.0.space_dimension()
    }

    /// Number of generators.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` iff there are no generators.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert `g`, adjusting its topology to match this system's if needed.
    ///
    /// In an NNC system, inserting a point also inserts its matching
    /// closure point (the same row with the epsilon column zeroed) so the
    /// point/closure-point pairing invariant of the data model holds by
    /// construction. A duplicate companion is harmless; minimisation prunes
    /// it.
    pub fn insert(&mut self, g: Generator) {
        let wants_companion = self.topology().is_nnc() && g.is_point();
        self.0.insert(g.into_row());
        if wants_companion {
            let last = self.0.matrix().nrows() - 1;
            let cp = closure_companion(self.0.matrix().row(last));
            self.0.insert(cp);
        }
    }

    /// As [`GeneratorSystem::insert`], but as a pending row.
    pub fn insert_pending(&mut self, g: Generator) {
        let wants_companion = self.topology().is_nnc() && g.is_point();
        self.0.insert_pending(g.into_row());
        if wants_companion {
            let last = self.0.matrix().nrows() - 1;
            let cp = closure_companion(self.0.matrix().row(last));
            self.0.insert_pending(cp);
        }
    }

    /// Insert an internally produced row verbatim (no companion logic); the
    /// row is already in this system's topology and width.
    pub(crate) fn insert_raw(&mut self, row: Row) {
        self.0.insert(row);
    }

    /// Borrow generator `i`.
    pub fn get(&self, i: usize) -> Generator {
        Generator(self.0.matrix().row(i).clone())
    }

    /// Iterate over every generator, active then pending.
    pub fn iter(&self) -> impl Iterator<Item = Generator> + '_ {
        self.0.matrix().iter().map(|r| Generator(r.clone()))
    }

    /// Number of line rows.
    pub fn num_lines(&self) -> usize {
        self.0
            .matrix()
            .active_rows()
            .filter(|r| r.kind() == RowKind::Line)
            .count()
    }

    /// `true` iff, for every closure point in this (NNC) system, an
    /// identical point (same coordinates and divisor, modulo the epsilon
    /// column) is also present — the invariant spec.md §4.2's
    /// `adjust_topology_and_space_dimension` checks before dropping the
    /// epsilon column.
    pub fn every_closure_point_is_matched_by_a_point(&self) -> bool {
        if !self.topology().is_nnc() {
            return true;
        }
        let points: Vec<&crate::row::Row> = self
            .0
            .matrix()
            .active_rows()
            .filter(|r| r.kind() == RowKind::Point)
            .collect();
        self.0
            .matrix()
            .active_rows()
            .filter(|r| r.kind() == RowKind::ClosurePoint)
            .all(|cp| {
                points.iter().any(|p| {
                    let eps = cp.epsilon_index().unwrap_or(cp.len());
                    p.coefficients()[..eps] == cp.coefficients()[..eps]
                })
            })
    }

    /// Number of point rows.
    pub fn num_points(&self) -> usize {
        self.0
            .matrix()
            .active_rows()
            .filter(|r| r.kind() == RowKind::Point)
            .count()
    }
}

/// The closure point matching `point_row`: same coordinates and divisor,
/// epsilon zeroed.
fn closure_companion(point_row: &Row) -> Row {
    let mut cp = point_row.clone();
    if let Some(eps) = cp.epsilon_index() {
        *cp.coeff_mut(eps) = Coefficient::zero();
    }
    cp.set_kind(RowKind::ClosurePoint);
    cp.strong_normalize();
    cp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{LinearExpression, Variable};
    use crate::generator::Generator;

    #[test]
    fn insert_and_count_lines() {
        let mut gs = GeneratorSystem::new(1, Topology::Closed);
        gs.insert(Generator::line(LinearExpression::from_variable(Variable::new(0))));
        let mut origin = LinearExpression::constant(0);
        origin.set_coefficient(Variable::new(0), Coefficient::zero());
        gs.insert(Generator::point_unit(origin));
        assert_eq!(gs.num_lines(), 1);
        assert_eq!(gs.len(), 2);
    }

    #[test]
    fn inserting_a_point_into_an_nnc_system_adds_its_closure_companion() {
        let mut gs = GeneratorSystem::new(1, Topology::Nnc);
        gs.insert(Generator::point_unit(LinearExpression::from_variable(Variable::new(0))));
        assert_eq!(gs.len(), 2);
        assert!(gs.every_closure_point_is_matched_by_a_point());
    }

    #[test]
    fn unmatched_closure_point_is_detected() {
        let mut gs = GeneratorSystem::new(1, Topology::Nnc);
        gs.insert(Generator::closure_point(
            LinearExpression::from_variable(Variable::new(0)),
            1,
        ));
        assert!(!gs.every_closure_point_is_matched_by_a_point());
        gs.insert(Generator::point_unit(LinearExpression::from_variable(Variable::new(0))));
        assert!(gs.every_closure_point_is_matched_by_a_point());
    }
}
