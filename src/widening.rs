// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The H79 and BHRZ03 widening operators: given the previous iterate
//! `prev` and the current, larger iterate `cur` of an ascending chain
//! (`prev ⊆ cur`), produce a polyhedron containing `cur` such that
//! repeated widening along the chain stabilises after finitely many
//! steps.

use crate::constraint::Constraint;
use crate::constraint_system::ConstraintSystem;
use crate::generator_system::GeneratorSystem;
use crate::row::{RowKind, Topology};

/// The constraints of `prev` that `cur` still satisfies, equalities split
/// into their two sides first (one side of an outgrown equality often
/// survives on its own). This is the H79 selection rule: every widening
/// step can only shrink the surviving subset of `prev`'s finitely many
/// rows, so a chain of widenings cannot ascend forever.
fn stable_subset(prev_constraints: &ConstraintSystem, cur_generators: &GeneratorSystem) -> Vec<Constraint> {
    let mut kept = Vec::new();
    for c in prev_constraints.iter() {
        if c.is_equality() {
            let mut fwd = c.into_row();
            fwd.set_kind(RowKind::NonStrictInequality);
            let mut bwd = fwd.clone();
            bwd.negate();
            for side in [Constraint(fwd), Constraint(bwd)] {
                if cur_generators.iter().all(|g| side.is_satisfied_by(&g)) {
                    kept.push(side);
                }
            }
        } else if cur_generators.iter().all(|g| c.is_satisfied_by(&g)) {
            kept.push(c);
        }
    }
    kept
}

/// H79 widening: the constraints of `prev_constraints` still satisfied by
/// every generator of the current iterate, rebuilt as a fresh system over
/// `dim` dimensions.
pub fn h79(
    prev_constraints: &ConstraintSystem,
    cur_generators: &GeneratorSystem,
    dim: usize,
    topology: Topology,
) -> ConstraintSystem {
    let mut out = ConstraintSystem::new(dim, topology);
    for c in stable_subset(prev_constraints, cur_generators) {
        out.insert(c);
    }
    out
}

/// BHRZ03 widening: the H79 core, refined by keeping every constraint of
/// the current iterate that is saturated by all of the previous iterate's
/// generators. Those rows pin down `prev`'s affine hull; retaining them
/// preserves equalities H79's inequality-splitting would weaken. The
/// refinement terminates along a chain because the affine hull of the
/// iterates can only grow, and each growth step strictly shrinks the set
/// of retainable rows.
pub fn bhrz03(
    prev_constraints: &ConstraintSystem,
    prev_generators: &GeneratorSystem,
    cur_constraints: &ConstraintSystem,
    cur_generators: &GeneratorSystem,
    dim: usize,
    topology: Topology,
) -> ConstraintSystem {
    let mut out = h79(prev_constraints, cur_generators, dim, topology);
    for c in cur_constraints.iter() {
        let saturated_by_prev = prev_generators
            .iter()
            .all(|g| c.row().reduced_scalar_product(g.row()).is_zero());
        if saturated_by_prev && !out.iter().any(|kept| kept == c) {
            out.insert(c);
        }
    }
    out
}
