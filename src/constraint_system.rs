// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A typed view of a [`LinearSystem`] whose rows are all [`Constraint`]s.

use crate::constraint::Constraint;
use crate::linear_system::LinearSystem;
use crate::row::{RowKind, Topology};

/// A set of linear constraints sharing one topology and space dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintSystem(LinearSystem);

impl ConstraintSystem {
    /// An empty system over `space_dim` dimensions.
    pub fn new(space_dim: usize, topology: Topology) -> Self {
        ConstraintSystem(LinearSystem::new(space_dim, topology))
    }

    /// Wrap an existing [`LinearSystem`] known to hold only constraint rows.
    pub fn from_linear_system(system: LinearSystem) -> Self {
        ConstraintSystem(system)
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

    /// The space dimension every constraint is stated over.
    pub fn space_dimension(&self) -> usize {
        self.0.space_dimension()
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` iff there are no constraints.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert `c`, adjusting its topology to match this system's if needed.
    pub fn insert(&mut self, c: Constraint) {
        self.0.insert(c.into_row());
    }

    /// As [`ConstraintSystem::insert`], but as a pending row.
    pub fn insert_pending(&mut self, c: Constraint) {
        self.0.insert_pending(c.into_row());
    }

    /// Borrow constraint `i`.
    pub fn get(&self, i: usize) -> Constraint {
        Constraint(self.0.matrix().row(i).clone())
    }

    /// Iterate over every constraint, active then pending.
    pub fn iter(&self) -> impl Iterator<Item = Constraint> + '_ {
        self.0.matrix().iter().map(|r| Constraint(r.clone()))
    }

    /// `true` iff `self` contains a constraint whose homogeneous part is
    /// entirely zero but which is nonetheless unsatisfiable: `-1 >= 0` (the
    /// canonical representation of an otherwise-unwitnessed empty
    /// polyhedron, spec.md §4.5) or a non-zero constant equality. These
    /// rows carry no direction for any generator to disagree with, so the
    /// dual conversion alone can fail to notice them.
    pub fn contains_inconsistent_constraint(&self) -> bool {
        self.iter().any(|c| {
            let homogeneous_zero = (0..c.space_dimension())
                .all(|i| c.coefficient(crate::constraint::Variable::new(i)).is_zero());
            if !homogeneous_zero {
                return false;
            }
            if c.is_non_strict_inequality() {
                c.inhomogeneous_term().is_negative()
            } else if c.is_equality() {
                !c.inhomogeneous_term().is_zero()
            } else {
                // strict: `b > 0` with b <= 0
                !c.inhomogeneous_term().is_positive()
            }
        })
    }

    /// `true` iff some row is a strict inequality.
    pub fn has_strict_inequalities(&self) -> bool {
        self.0
            .matrix()
            .iter()
            .any(|r| r.kind() == RowKind::StrictInequality)
    }

    /// Number of equality rows.
    pub fn num_equalities(&self) -> usize {
        self.0
            .matrix()
            .active_rows()
            .filter(|r| r.kind() == RowKind::Equality)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{LinearExpression, Variable};

    #[test]
    fn insert_and_iterate() {
        let mut cs = ConstraintSystem::new(1, Topology::Closed);
        cs.insert(Constraint::non_strict_inequality(LinearExpression::from_variable(
            Variable::new(0),
        )));
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.num_equalities(), 0);
    }

    #[test]
    fn detects_the_canonical_inconsistent_constraint() {
        let mut cs = ConstraintSystem::new(1, Topology::Closed);
        cs.insert(Constraint::non_strict_inequality(LinearExpression::constant(-1)));
        assert!(cs.contains_inconsistent_constraint());
    }
}
