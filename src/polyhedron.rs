// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! [`Polyhedron`]: the orchestrating façade that keeps a constraint system
//! and a generator system describing the same convex set, refreshing the
//! stale side on demand through the double-description engine.
//!
//! NNC polyhedra are handled through the epsilon dimension: a strict
//! inequality is a non-strict one over the extended column vector, and the
//! generator side of an NNC polyhedron is the generator system of the
//! closed region `0 <= eps <= 1` intersected with the epsilon-extended
//! constraints. A generator with positive divisor is then a point when its
//! epsilon coordinate is positive and a closure point when it is zero.

use crate::bigint::Coefficient;
use crate::bitset::BitsetMatrix;
use crate::constraint::{Constraint, LinearExpression, Variable};
use crate::constraint_system::ConstraintSystem;
use crate::conversion::{convert_row, ConversionOutcome};
use crate::error::{PplError, Result};
use crate::generator::Generator;
use crate::generator_system::GeneratorSystem;
use crate::kv::Kv;
use crate::relation::{PolyConRelation, PolyGenRelation};
use crate::row::{Row, RowKind, Topology};
use crate::saturation::{Orientation, SaturationMatrix};
use crate::simplify::{redundant_rows, reduce_lines_or_equalities};
use crate::status::Status;
use crate::widening;
use std::fmt;

type Poll<'a> = Option<&'a dyn Fn() -> bool>;

/// A convex polyhedron over the rationals, represented as a pair of dual
/// systems kept consistent on demand.
///
/// Every operation that may trigger the lazy conversion takes `&mut self`,
/// including queries; after [`Polyhedron::minimize`] both representations
/// and both saturation matrices are fresh and read-only inspection is
/// safe.
#[derive(Clone, Debug)]
pub struct Polyhedron {
    pub(crate) space_dim: usize,
    pub(crate) topology: Topology,
    pub(crate) status: Status,
    pub(crate) constraints: ConstraintSystem,
    pub(crate) generators: GeneratorSystem,
    /// Rows indexed by generators, bits over constraints.
    pub(crate) sat_c: SaturationMatrix,
    /// Rows indexed by constraints, bits over generators.
    pub(crate) sat_g: SaturationMatrix,
}

impl Polyhedron {
    /// The universe polyhedron: all of the `space_dim`-dimensional space.
    pub fn universe(space_dim: usize, topology: Topology) -> Self {
        let mut status = Status::default();
        status.set_zero_dim_univ(space_dim == 0);
        // The empty constraint system alone is authoritative; generators
        // are derived on first use.
        status.set_g_up_to_date(false);
        Polyhedron::assemble(
            space_dim,
            topology,
            status,
            ConstraintSystem::new(space_dim, topology),
            GeneratorSystem::new(space_dim, topology),
        )
    }

    /// The empty polyhedron.
    pub fn empty(space_dim: usize, topology: Topology) -> Self {
        let mut constraints = ConstraintSystem::new(space_dim, topology);
        constraints.insert(Constraint::non_strict_inequality(LinearExpression::constant(-1)));
        Polyhedron::assemble(
            space_dim,
            topology,
            Status::empty(),
            constraints,
            GeneratorSystem::new(space_dim, topology),
        )
    }

    /// Build from a constraint system, deferring conversion. Pending rows
    /// of the incoming system are treated as active.
    pub fn from_constraints(mut constraints: ConstraintSystem) -> Self {
        constraints.linear_system_mut().matrix_mut().clear_pending();
        let space_dim = constraints.space_dimension();
        let topology = constraints.topology();
        let mut status = Status::default();
        status.set_zero_dim_univ(false);
        status.set_g_up_to_date(false);
        status.set_c_minimized(false);
        Polyhedron::assemble(
            space_dim,
            topology,
            status,
            constraints,
            GeneratorSystem::new(space_dim, topology),
        )
    }

    /// Build from a generator system, deferring conversion. Pending rows
    /// of the incoming system are treated as active.
    pub fn from_generators(mut generators: GeneratorSystem) -> Self {
        generators.linear_system_mut().matrix_mut().clear_pending();
        let space_dim = generators.space_dimension();
        let topology = generators.topology();
        let mut status = Status::default();
        status.set_zero_dim_univ(false);
        status.set_c_up_to_date(false);
        status.set_g_minimized(false);
        Polyhedron::assemble(
            space_dim,
            topology,
            status,
            ConstraintSystem::new(space_dim, topology),
            generators,
        )
    }

    /// Build from a box of per-dimension integer bounds: `bounds[i]` is
    /// `(lower, upper)` for coordinate `i`, either side `None` when
    /// unbounded. An infeasible box (some lower bound above its upper
    /// bound) yields the empty polyhedron.
    pub fn from_box(
        bounds: &[(Option<Coefficient>, Option<Coefficient>)],
        topology: Topology,
    ) -> Result<Self> {
        let space_dim = bounds.len();
        if space_dim > crate::max_space_dimension() {
            return Err(PplError::SpaceDimensionOverflow {
                requested: space_dim,
                limit: crate::max_space_dimension(),
            });
        }
        let mut constraints = ConstraintSystem::new(space_dim, topology);
        for (i, (lower, upper)) in bounds.iter().enumerate() {
            let v = Variable::new(i);
            if let Some(l) = lower {
                // x_i - l >= 0
                let mut e = LinearExpression::from_variable(v);
                e.set_inhomogeneous_term(-l.clone());
                constraints.insert(Constraint::non_strict_inequality(e));
            }
            if let Some(u) = upper {
                // u - x_i >= 0
                let mut e = -LinearExpression::from_variable(v);
                e.set_inhomogeneous_term(u.clone());
                constraints.insert(Constraint::non_strict_inequality(e));
            }
        }
        Ok(Polyhedron::from_constraints(constraints))
    }

    fn assemble(
        space_dim: usize,
        topology: Topology,
        status: Status,
        constraints: ConstraintSystem,
        generators: GeneratorSystem,
    ) -> Self {
        Polyhedron {
            space_dim,
            topology,
            status,
            constraints,
            generators,
            sat_c: SaturationMatrix::new(Orientation::RowsAreGenerators, 0),
            sat_g: SaturationMatrix::new(Orientation::RowsAreConstraints, 0),
        }
    }

    /// A copy of `self` carried over to `topology`.
    ///
    /// Any polyhedron can move from closed to NNC. The reverse transition
    /// succeeds only when `self` is topologically closed; otherwise a
    /// topology-incompatibility error is returned, matching the
    /// boolean-failure contract of the underlying system adjustment.
    pub fn with_topology(&self, topology: Topology) -> Result<Polyhedron> {
        if topology == self.topology {
            return Ok(self.clone());
        }
        let mut source = self.clone();
        if source.status.is_empty() {
            return Ok(Polyhedron::empty(source.space_dim, topology));
        }
        if topology.is_nnc() {
            source.update_constraints();
        } else {
            if !source.is_topologically_closed() {
                return Err(PplError::TopologyIncompatible {
                    text: "cannot build a closed polyhedron from one that is not topologically closed"
                        .to_string(),
                });
            }
            source.minimize();
        }
        let mut system = source.constraints.into_linear_system();
        system.adjust_topology_and_space_dimension(topology, self.space_dim, false);
        Ok(Polyhedron::from_constraints(ConstraintSystem::from_linear_system(system)))
    }

    /// The space dimension.
    pub fn space_dimension(&self) -> usize {
        self.space_dim
    }

    /// The topology (closed or NNC).
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Bring the constraint representation up to date, converting from
    /// generators if necessary.
    pub fn update_constraints(&mut self) {
        if self.status.is_empty() || self.status.c_up_to_date() {
            return;
        }
        // No poll hook installed, so this cannot time out.
        let _ = self.rebuild_constraints(None);
    }

    /// Bring the generator representation up to date, converting from
    /// constraints if necessary.
    pub fn update_generators(&mut self) {
        if self.status.is_empty() || self.status.g_up_to_date() {
            return;
        }
        let _ = self.rebuild_generators(None);
    }

    #[tracing::instrument(level = "debug", skip(self, poll), fields(dim = self.space_dim))]
    fn rebuild_constraints(&mut self, poll: Poll<'_>) -> Result<()> {
        match constraints_from_generators(self.space_dim, self.topology, &self.generators, poll)? {
            Some(cs) => {
                tracing::debug!(rows = cs.len(), "constraints rebuilt from generators");
                self.constraints = cs;
                self.status.set_c_minimized(true);
            }
            None => self.set_empty(),
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, poll), fields(dim = self.space_dim))]
    fn rebuild_generators(&mut self, poll: Poll<'_>) -> Result<()> {
        if self.constraints.contains_inconsistent_constraint() {
            self.set_empty();
            return Ok(());
        }
        match generators_from_constraints(self.space_dim, self.topology, &self.constraints, poll)? {
            Some(gs) => {
                tracing::debug!(rows = gs.len(), "generators rebuilt from constraints");
                self.generators = gs;
                self.status.set_g_minimized(true);
            }
            None => self.set_empty(),
        }
        Ok(())
    }

    fn set_empty(&mut self) {
        self.status.set_empty(true);
        self.constraints = ConstraintSystem::new(self.space_dim, self.topology);
        self.constraints
            .insert(Constraint::non_strict_inequality(LinearExpression::constant(-1)));
        self.generators = GeneratorSystem::new(self.space_dim, self.topology);
        self.sat_c = SaturationMatrix::new(Orientation::RowsAreGenerators, 0);
        self.sat_g = SaturationMatrix::new(Orientation::RowsAreConstraints, 0);
    }

    /// Minimize both representations, dropping redundant rows and
    /// refreshing the saturation matrices. Returns `false` iff the
    /// polyhedron is empty.
    pub fn minimize(&mut self) -> bool {
        // No poll hook installed, so this cannot time out.
        matches!(self.minimize_with_hook(None), Ok(true))
    }

    /// As [`Polyhedron::minimize`], polling `poll` between conversion
    /// steps; when it reports true the operation aborts with a timeout
    /// error before any observable state has been touched.
    pub fn minimize_with_timeout(&mut self, poll: &dyn Fn() -> bool) -> Result<bool> {
        self.minimize_with_hook(Some(poll))
    }

    fn minimize_with_hook(&mut self, poll: Poll<'_>) -> Result<bool> {
        if self.status.is_empty() {
            return Ok(false);
        }
        if self.status.c_minimized()
            && self.status.g_minimized()
            && self.status.sat_c_up_to_date()
            && self.status.sat_g_up_to_date()
        {
            return Ok(true);
        }
        if !self.status.c_up_to_date() {
            self.rebuild_constraints(poll)?;
        }
        if !self.status.is_empty() && !self.status.g_minimized() {
            self.rebuild_generators(poll)?;
        }
        if !self.status.is_empty() && !self.status.c_minimized() {
            self.rebuild_constraints(poll)?;
        }
        if self.status.is_empty() {
            return Ok(false);
        }
        self.refresh_saturation();
        tracing::debug!(summary = %Kv::new()
            .with("dim", self.space_dim)
            .with("constraints", self.constraints.len())
            .with("generators", self.generators.len()),
            "minimized");
        Ok(true)
    }

    fn refresh_saturation(&mut self) {
        let gen_rows: Vec<Row> = self.generators.iter().map(|g| g.into_row()).collect();
        let con_rows: Vec<Row> = self.constraints.iter().map(|c| c.into_row()).collect();
        self.sat_c = SaturationMatrix::build(&gen_rows, &con_rows, Orientation::RowsAreGenerators);
        self.sat_g = self.sat_c.transpose();
        self.status.set_sat_c_up_to_date(true);
        self.status.set_sat_g_up_to_date(true);
    }

    /// `true` iff this polyhedron has no points.
    pub fn is_empty(&mut self) -> bool {
        !self.minimize()
    }

    /// `true` iff this polyhedron is the whole space.
    pub fn is_universe(&mut self) -> bool {
        self.minimize() && self.constraints.is_empty()
    }

    /// `true` iff this polyhedron is bounded (its generator system has no
    /// line or ray).
    pub fn is_bounded(&mut self) -> bool {
        if !self.minimize() {
            return true;
        }
        self.generators.iter().all(|g| g.is_point() || g.is_closure_point())
    }

    /// `true` iff this polyhedron holds at most one point.
    pub fn is_discrete(&mut self) -> bool {
        self.affine_dimension() == 0
    }

    /// `true` iff this polyhedron equals its own topological closure;
    /// trivially so for closed polyhedra, and for NNC ones iff the
    /// minimized constraint system retains no strict inequality.
    pub fn is_topologically_closed(&mut self) -> bool {
        if !self.topology.is_nnc() || !self.minimize() {
            return true;
        }
        !self.constraints.has_strict_inequalities()
    }

    /// The dimension of the affine hull: the space dimension minus the
    /// number of independent equalities, and 0 for an empty polyhedron.
    pub fn affine_dimension(&mut self) -> usize {
        if !self.minimize() {
            return 0;
        }
        self.space_dim - self.constraints.num_equalities()
    }

    /// The constraint system, minimized.
    pub fn constraints(&mut self) -> &ConstraintSystem {
        self.minimize();
        &self.constraints
    }

    /// The generator system, minimized (empty iff the polyhedron is).
    pub fn generators(&mut self) -> &GeneratorSystem {
        self.minimize();
        &self.generators
    }

    pub(crate) fn saturation_by_generators(&mut self) -> &SaturationMatrix {
        self.minimize();
        &self.sat_c
    }

    pub(crate) fn saturation_by_constraints(&mut self) -> &SaturationMatrix {
        self.minimize();
        &self.sat_g
    }

    /// Add `c` to the constraint system, invalidating the generator
    /// representation. Adding to an empty polyhedron is a no-op.
    pub fn add_constraint(&mut self, c: Constraint) -> Result<()> {
        if c.space_dimension() > self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: c.space_dimension(),
            });
        }
        if c.is_strict_inequality() && !self.topology.is_nnc() {
            return Err(PplError::TopologyIncompatible {
                text: "a strict inequality cannot enter a closed polyhedron".to_string(),
            });
        }
        if self.status.is_empty() {
            return Ok(());
        }
        self.update_constraints();
        self.constraints.insert(c);
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// Add `g` to the generator system, invalidating the constraint
    /// representation. An empty polyhedron is promoted out of emptiness
    /// iff `g` is a point (closure points, rays and lines have nothing to
    /// attach to and leave it empty).
    pub fn add_generator(&mut self, g: Generator) -> Result<()> {
        if g.space_dimension() > self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: g.space_dimension(),
            });
        }
        if g.is_closure_point() && !self.topology.is_nnc() {
            return Err(PplError::TopologyIncompatible {
                text: "a closure point cannot enter a closed polyhedron".to_string(),
            });
        }
        if (g.is_ray() || g.is_line()) && g.row().all_homogeneous_terms_zero() {
            return Err(PplError::InvalidArgument {
                text: "a ray or line needs a non-zero direction".to_string(),
            });
        }
        if self.status.is_empty() {
            if !g.is_point() {
                return Ok(());
            }
            self.generators = GeneratorSystem::new(self.space_dim, self.topology);
            self.generators.insert(g);
            self.constraints = ConstraintSystem::new(self.space_dim, self.topology);
            self.status.set_empty(false);
            self.status.set_g_up_to_date(true);
            self.status.set_g_minimized(false);
            self.status.set_c_up_to_date(false);
            return Ok(());
        }
        self.update_generators();
        self.generators.insert(g);
        self.status.set_g_minimized(false);
        self.status.set_c_up_to_date(false);
        self.status.set_sat_g_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    fn check_binary_compatible(&self, other: &Polyhedron) -> Result<()> {
        if self.space_dim != other.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: other.space_dim,
            });
        }
        if self.topology != other.topology {
            return Err(PplError::TopologyIncompatible {
                text: "binary operations need operands of one topology".to_string(),
            });
        }
        Ok(())
    }

    /// Intersect `self` with `other` in place.
    #[tracing::instrument(level = "debug", skip(self, other), fields(dim = self.space_dim))]
    pub fn intersection_assign(&mut self, other: &Polyhedron) -> Result<()> {
        self.check_binary_compatible(other)?;
        if self.status.is_empty() {
            return Ok(());
        }
        self.update_constraints();
        let merge = |target: &mut Polyhedron, source: &ConstraintSystem| {
            for c in source.iter() {
                target.constraints.insert(c);
            }
        };
        if other.status.c_up_to_date() {
            merge(self, &other.constraints);
        } else {
            let mut o = other.clone();
            o.update_constraints();
            merge(self, &o.constraints);
        }
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// Replace `self` with the poly-hull (convex hull of the union) of
    /// `self` and `other`.
    #[tracing::instrument(level = "debug", skip(self, other), fields(dim = self.space_dim))]
    pub fn poly_hull_assign(&mut self, other: &Polyhedron) -> Result<()> {
        self.check_binary_compatible(other)?;
        let mut o = other.clone();
        o.update_generators();
        if o.status.is_empty() {
            return Ok(());
        }
        if self.status.is_empty() {
            *self = o;
            return Ok(());
        }
        self.update_generators();
        for g in o.generators.iter() {
            self.generators.insert(g);
        }
        self.status.set_g_minimized(false);
        self.status.set_c_up_to_date(false);
        self.status.set_sat_g_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// An alias for [`Polyhedron::poly_hull_assign`]: for polyhedra the
    /// least upper bound is the poly-hull itself, so both names point to
    /// one routine.
    pub fn upper_bound_assign(&mut self, other: &Polyhedron) -> Result<()> {
        self.poly_hull_assign(other)
    }

    /// Compute the poly-hull of `self` and `other`, but keep it only when
    /// it is exact, i.e. adds no point beyond the set union. Returns
    /// whether the hull was kept; on `false`, `self` is unchanged.
    pub fn poly_hull_assign_if_exact(&mut self, other: &Polyhedron) -> Result<bool> {
        self.check_binary_compatible(other)?;
        let mut o = other.clone();
        if !o.minimize() {
            return Ok(true);
        }
        if !self.minimize() {
            *self = o;
            return Ok(true);
        }
        let original = self.clone();
        self.poly_hull_assign(&o)?;
        self.minimize();

        // The hull is exact iff no point of it strictly violates one
        // constraint of each operand at once (the convexity-of-the-union
        // criterion). Only constraints the other operand breaks matter.
        let x_sides: Vec<Constraint> = side_inequalities(&original.constraints)
            .into_iter()
            .filter(|c| !o.generators.iter().all(|g| c.is_satisfied_by(&g)))
            .collect();
        let y_sides: Vec<Constraint> = side_inequalities(&o.constraints)
            .into_iter()
            .filter(|c| !original.generators.iter().all(|g| c.is_satisfied_by(&g)))
            .collect();
        for cx in &x_sides {
            for cy in &y_sides {
                if cx.row().difference_class(cy.row()) == 0 {
                    continue;
                }
                let mut carved = self.clone();
                carved.add_constraint(violation_of(cx, self.topology))?;
                carved.add_constraint(violation_of(cy, self.topology))?;
                if carved.is_empty() {
                    continue;
                }
                if self.topology.is_nnc() {
                    *self = original;
                    return Ok(false);
                }
                // Closed topology cannot carve the open violated region
                // directly; a non-empty closed carving that collapses onto
                // one of the two boundaries is still exact.
                let on_cx = carved.relation_with(cx).implies(PolyConRelation::SATURATES);
                let on_cy = carved.relation_with(cy).implies(PolyConRelation::SATURATES);
                if !(on_cx || on_cy) {
                    *self = original;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Apply the affine map `x_var <- (expr) / denominator` to this
    /// polyhedron, acting on generators. `denominator` must be strictly
    /// positive.
    #[tracing::instrument(level = "debug", skip(self, expr), fields(dim = self.space_dim))]
    pub fn affine_image(
        &mut self,
        var: Variable,
        expr: &LinearExpression,
        denominator: &Coefficient,
    ) -> Result<()> {
        self.check_affine_args(var, expr, denominator)?;
        if self.status.is_empty() {
            return Ok(());
        }
        self.update_generators();
        let mut gs = GeneratorSystem::new(self.space_dim, self.topology);
        for g in self.generators.iter() {
            gs.insert_raw(affine_image_row(g.row(), var, expr, denominator));
        }
        // A non-invertible map can squash valid lines and rays onto the
        // origin of the space.
        let invertible =
            var.index() < expr.space_dimension() && !expr.coefficient(var).is_zero();
        if !invertible {
            gs.linear_system_mut().matrix_mut().remove_invalid_lines_and_rays();
        }
        self.generators = gs;
        self.status.set_g_up_to_date(true);
        self.status.set_g_minimized(false);
        self.status.set_c_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// Apply the preimage of the same affine map, acting on constraints
    /// (which transform by substitution, the mirror direction of
    /// generators).
    #[tracing::instrument(level = "debug", skip(self, expr), fields(dim = self.space_dim))]
    pub fn affine_preimage(
        &mut self,
        var: Variable,
        expr: &LinearExpression,
        denominator: &Coefficient,
    ) -> Result<()> {
        self.check_affine_args(var, expr, denominator)?;
        if self.status.is_empty() {
            return Ok(());
        }
        self.update_constraints();
        let mut cs = ConstraintSystem::new(self.space_dim, self.topology);
        for c in self.constraints.iter() {
            cs.insert(Constraint(affine_substitute_row(c.row(), var, expr, denominator)));
        }
        self.constraints = cs;
        self.status.set_c_up_to_date(true);
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    fn check_affine_args(
        &self,
        var: Variable,
        expr: &LinearExpression,
        denominator: &Coefficient,
    ) -> Result<()> {
        if !denominator.is_positive() {
            return Err(PplError::InvalidArgument {
                text: "the denominator of an affine map must be strictly positive".to_string(),
            });
        }
        if var.index() >= self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: var.space_dimension(),
            });
        }
        if expr.space_dimension() > self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: expr.space_dimension(),
            });
        }
        Ok(())
    }

    fn check_dimension_growth(&self, added: usize) -> Result<()> {
        let limit = crate::max_space_dimension();
        if added > limit - self.space_dim.min(limit) {
            return Err(PplError::SpaceDimensionOverflow {
                requested: self.space_dim.saturating_add(added),
                limit,
            });
        }
        Ok(())
    }

    /// Append `n` unconstrained dimensions: existing points keep their
    /// coordinates and the new coordinates range freely.
    pub fn add_space_dimensions_and_embed(&mut self, n: usize) -> Result<()> {
        self.check_dimension_growth(n)?;
        if n == 0 {
            return Ok(());
        }
        if self.status.is_empty() {
            self.space_dim += n;
            self.set_empty();
            return Ok(());
        }
        if self.status.c_up_to_date() {
            self.constraints.linear_system_mut().matrix_mut().add_zero_columns(n);
        }
        if self.status.g_up_to_date() {
            let gm = self.generators.linear_system_mut().matrix_mut();
            gm.add_zero_columns(n);
            let width = gm.ncols();
            let eps = self.topology.is_nnc() as usize;
            for i in 0..n {
                let mut coeffs = vec![Coefficient::zero(); width];
                coeffs[width - eps - n + i] = Coefficient::one();
                gm.insert(Row::new(RowKind::Line, self.topology, coeffs));
            }
            gm.sort_rows();
        }
        self.status.set_sat_c_up_to_date(false);
        self.status.set_sat_g_up_to_date(false);
        self.space_dim += n;
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// Append `n` new dimensions, each constrained to zero.
    pub fn add_space_dimensions_and_project(&mut self, n: usize) -> Result<()> {
        self.check_dimension_growth(n)?;
        if n == 0 {
            return Ok(());
        }
        if self.status.is_empty() {
            self.space_dim += n;
            self.set_empty();
            return Ok(());
        }
        if self.status.g_up_to_date() {
            self.generators.linear_system_mut().matrix_mut().add_zero_columns(n);
        }
        if self.status.c_up_to_date() {
            let cm = self.constraints.linear_system_mut().matrix_mut();
            cm.add_zero_columns(n);
            let width = cm.ncols();
            let eps = self.topology.is_nnc() as usize;
            for i in 0..n {
                let mut coeffs = vec![Coefficient::zero(); width];
                coeffs[width - eps - n + i] = Coefficient::one();
                cm.insert(Row::new(RowKind::Equality, self.topology, coeffs));
            }
            cm.sort_rows();
        }
        self.status.set_sat_c_up_to_date(false);
        self.status.set_sat_g_up_to_date(false);
        self.space_dim += n;
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// Project the given dimensions away, shrinking the space dimension by
    /// their count.
    pub fn remove_space_dimensions(&mut self, vars: &[Variable]) -> Result<()> {
        let mut cols: Vec<usize> = vars.iter().map(|v| v.index() + 1).collect();
        cols.sort_unstable();
        cols.dedup();
        if let Some(&last) = cols.last() {
            if last > self.space_dim {
                return Err(PplError::DimensionIncompatible {
                    left: self.space_dim,
                    right: last,
                });
            }
        } else {
            return Ok(());
        }
        if self.status.is_empty() {
            self.space_dim -= cols.len();
            self.set_empty();
            return Ok(());
        }
        self.update_generators();
        self.generators.linear_system_mut().matrix_mut().remove_columns(&cols);
        self.generators
            .linear_system_mut()
            .matrix_mut()
            .remove_invalid_lines_and_rays();
        self.space_dim -= cols.len();
        self.constraints = ConstraintSystem::new(self.space_dim, self.topology);
        self.status.set_g_up_to_date(true);
        self.status.set_g_minimized(false);
        self.status.set_c_up_to_date(false);
        self.status.set_sat_g_up_to_date(false);
        Ok(())
    }

    /// Remap space dimensions along a partial injection: `mapping[i]` is
    /// the new index of dimension `i`, or `None` to project the dimension
    /// away. The `Some` targets must be exactly `0..k` for `k` surviving
    /// dimensions, in any order.
    pub fn map_space_dimensions(&mut self, mapping: &[Option<usize>]) -> Result<()> {
        if mapping.len() != self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: mapping.len(),
            });
        }
        let kept: Vec<usize> = mapping.iter().filter_map(|m| *m).collect();
        let k = kept.len();
        {
            let mut seen = vec![false; k];
            for &t in &kept {
                if t >= k || seen[t] {
                    return Err(PplError::InvalidArgument {
                        text: "dimension mapping must be an injection onto 0..k".to_string(),
                    });
                }
                seen[t] = true;
            }
        }
        let dropped: Vec<Variable> = mapping
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(i, _)| Variable::new(i))
            .collect();
        self.remove_space_dimensions(&dropped)?;
        if self.status.is_empty() || k == 0 {
            return Ok(());
        }
        // After removal the surviving old dimensions sit at 0..k in their
        // original order; rotate columns along the cycles of the residual
        // permutation.
        let mut perm = vec![0usize; k];
        for (rank, &target) in kept.iter().enumerate() {
            perm[rank] = target;
        }
        let mut cycles: Vec<Vec<usize>> = Vec::new();
        let mut visited = vec![false; k];
        for start in 0..k {
            if visited[start] || perm[start] == start {
                visited[start] = true;
                continue;
            }
            let mut cycle = Vec::new();
            let mut at = start;
            while !visited[at] {
                visited[at] = true;
                cycle.push(at + 1);
                at = perm[at];
            }
            cycles.push(cycle);
        }
        if !cycles.is_empty() {
            self.update_generators();
            self.generators.linear_system_mut().matrix_mut().permute_columns(&cycles);
            self.constraints = ConstraintSystem::new(self.space_dim, self.topology);
            self.status.set_g_up_to_date(true);
            self.status.set_g_minimized(false);
            self.status.set_c_up_to_date(false);
            self.status.set_sat_g_up_to_date(false);
        }
        Ok(())
    }

    /// Clone every constraint mentioning `var` into `n` copies, each with
    /// `var` renamed to one of `n` new trailing dimensions. The new
    /// dimensions behave as independent copies of `var`.
    pub fn expand_space_dimension(&mut self, var: Variable, n: usize) -> Result<()> {
        if var.index() >= self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: var.space_dimension(),
            });
        }
        self.check_dimension_growth(n)?;
        if n == 0 {
            return Ok(());
        }
        if self.status.is_empty() {
            self.space_dim += n;
            self.set_empty();
            return Ok(());
        }
        self.update_constraints();
        let cm = self.constraints.linear_system_mut().matrix_mut();
        cm.add_zero_columns(n);
        let width = cm.ncols();
        let eps = self.topology.is_nnc() as usize;
        let src = var.index() + 1;
        let mentioning: Vec<Row> = cm
            .iter()
            .filter(|r| !r.coeff(src).is_zero())
            .cloned()
            .collect();
        for row in mentioning {
            for j in 0..n {
                let mut copy = row.clone();
                let moved = copy.coeff(src).clone();
                *copy.coeff_mut(width - eps - n + j) = moved;
                *copy.coeff_mut(src) = Coefficient::zero();
                copy.strong_normalize();
                cm.insert(copy);
            }
        }
        self.space_dim += n;
        self.generators = GeneratorSystem::new(self.space_dim, self.topology);
        self.status.set_c_up_to_date(true);
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
        self.status.set_zero_dim_univ(false);
        Ok(())
    }

    /// Fold the dimensions in `vars` into `dest`: replace `self` with the
    /// poly-hull of its images under each substitution
    /// `x_dest <- x_v, v in vars`, then project the folded dimensions
    /// away.
    pub fn fold_space_dimensions(&mut self, vars: &[Variable], dest: Variable) -> Result<()> {
        if dest.index() >= self.space_dim {
            return Err(PplError::DimensionIncompatible {
                left: self.space_dim,
                right: dest.space_dimension(),
            });
        }
        if vars.iter().any(|v| v.index() == dest.index()) {
            return Err(PplError::InvalidArgument {
                text: "the destination of a fold cannot itself be folded".to_string(),
            });
        }
        if vars.is_empty() {
            return Ok(());
        }
        let mut acc = self.clone();
        for v in vars {
            let mut image = self.clone();
            image.affine_image(dest, &LinearExpression::from_variable(*v), &Coefficient::one())?;
            acc.poly_hull_assign(&image)?;
        }
        acc.remove_space_dimensions(vars)?;
        *self = acc;
        Ok(())
    }

    /// Append `other` as an independent block of trailing dimensions: the
    /// result has dimension `n + m` and its constraints are the disjoint
    /// union of both systems, `other`'s variables shifted up by `n`.
    pub fn concatenate_assign(&mut self, other: &Polyhedron) -> Result<()> {
        if self.topology != other.topology {
            return Err(PplError::TopologyIncompatible {
                text: "concatenation needs operands of one topology".to_string(),
            });
        }
        let n = self.space_dim;
        let m = other.space_dim;
        self.check_dimension_growth(m)?;
        let mut o = other.clone();
        o.update_constraints();
        if self.status.is_empty() || o.status.is_empty() {
            self.space_dim = n + m;
            self.set_empty();
            return Ok(());
        }
        self.update_constraints();
        self.add_space_dimensions_and_embed(m)?;
        let eps = self.topology.is_nnc() as usize;
        let width = n + m + 1 + eps;
        for c in o.constraints.iter() {
            let r = c.row();
            let mut coeffs = vec![Coefficient::zero(); width];
            coeffs[0] = r.coeff(0).clone();
            for j in 0..m {
                coeffs[n + 1 + j] = r.coeff(1 + j).clone();
            }
            if eps == 1 {
                coeffs[width - 1] = r.epsilon();
            }
            self.constraints.insert(Constraint(Row::new(r.kind(), self.topology, coeffs)));
        }
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
        Ok(())
    }

    /// Replace `self` with its topological closure: every strict
    /// inequality becomes non-strict. A no-op on closed polyhedra.
    pub fn topological_closure_assign(&mut self) {
        if !self.topology.is_nnc() || self.status.is_empty() {
            return;
        }
        self.update_constraints();
        let mut cs = ConstraintSystem::new(self.space_dim, self.topology);
        for c in self.constraints.iter() {
            let mut row = c.into_row();
            if row.kind() == RowKind::StrictInequality {
                if let Some(eps) = row.epsilon_index() {
                    *row.coeff_mut(eps) = Coefficient::zero();
                }
                row.set_kind(RowKind::NonStrictInequality);
                row.strong_normalize();
            }
            cs.insert(Constraint(row));
        }
        self.constraints = cs;
        self.status.set_c_up_to_date(true);
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
    }

    /// How this polyhedron relates to the constraint `c`: any combination
    /// of saturating it, being included in it, being disjoint from it, or
    /// straddling its boundary.
    pub fn relation_with(&mut self, c: &Constraint) -> PolyConRelation {
        if !self.minimize() {
            return PolyConRelation::SATURATES
                | PolyConRelation::IS_INCLUDED
                | PolyConRelation::IS_DISJOINT;
        }
        let mut all_sat = true;
        // Whether the polyhedron fits inside each closed/open half-space.
        let mut sub_ge = true;
        let mut sub_gt = true;
        let mut sub_le = true;
        let mut sub_lt = true;
        for g in self.generators.iter() {
            let sp = c.row().reduced_scalar_product(g.row());
            let s = sp.signum();
            if s != 0 {
                all_sat = false;
            }
            match g.row().kind() {
                RowKind::Line => {
                    if s != 0 {
                        sub_ge = false;
                        sub_gt = false;
                        sub_le = false;
                        sub_lt = false;
                    }
                }
                RowKind::Point => match s {
                    1 => {
                        sub_le = false;
                        sub_lt = false;
                    }
                    -1 => {
                        sub_ge = false;
                        sub_gt = false;
                    }
                    _ => {
                        sub_gt = false;
                        sub_lt = false;
                    }
                },
                // rays and closure points: the boundary is reachable
                // without witnessing a strict side.
                _ => match s {
                    1 => {
                        sub_le = false;
                        sub_lt = false;
                    }
                    -1 => {
                        sub_ge = false;
                        sub_gt = false;
                    }
                    _ => {}
                },
            }
        }
        let mut rel = PolyConRelation::nothing();
        if all_sat {
            rel |= PolyConRelation::SATURATES;
        }
        let (included, disjoint) = match c.row().kind() {
            RowKind::Equality => (all_sat, sub_gt || sub_lt),
            RowKind::StrictInequality => (sub_gt, sub_le),
            _ => (sub_ge, sub_lt),
        };
        if included {
            rel |= PolyConRelation::IS_INCLUDED;
        } else if disjoint {
            rel |= PolyConRelation::IS_DISJOINT;
        } else {
            rel |= PolyConRelation::STRICTLY_INTERSECTS;
        }
        rel
    }

    /// How this polyhedron relates to the generator `g`: currently the one
    /// meaningful bit, whether adding `g` would leave the polyhedron
    /// unchanged.
    pub fn relation_with_generator(&mut self, g: &Generator) -> PolyGenRelation {
        if !self.minimize() {
            return PolyGenRelation::nothing();
        }
        if self.constraints.iter().all(|c| c.is_satisfied_by(g)) {
            PolyGenRelation::SUBSUMES
        } else {
            PolyGenRelation::nothing()
        }
    }

    /// `true` iff `self` contains every point of `other`.
    pub fn contains(&mut self, other: &mut Polyhedron) -> bool {
        if self.space_dim != other.space_dim {
            return false;
        }
        if !other.minimize() {
            return true;
        }
        if !self.minimize() {
            return false;
        }
        other
            .generators
            .iter()
            .all(|g| self.constraints.iter().all(|c| c.is_satisfied_by(&g)))
    }

    /// `true` iff `self` and `other` denote the same set of points.
    pub fn equals(&mut self, other: &mut Polyhedron) -> bool {
        self.contains(other) && other.contains(self)
    }

    /// Widen `self` toward stability using the H79 operator; `other` is
    /// the previous, smaller iterate (`other ⊆ self` is the caller's
    /// precondition). The result keeps exactly the constraints of `other`
    /// that `self` still satisfies, so it contains `self` and the chain of
    /// widened iterates stabilises after finitely many steps.
    pub fn h79_widening_assign(&mut self, other: &Polyhedron) -> Result<()> {
        self.check_binary_compatible(other)?;
        let mut o = other.clone();
        if !o.minimize() {
            return Ok(());
        }
        if !self.minimize() {
            *self = o;
            return Ok(());
        }
        self.constraints = widening::h79(&o.constraints, &self.generators, self.space_dim, self.topology);
        self.status.set_c_up_to_date(true);
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
        Ok(())
    }

    /// Widen `self` toward stability using the BHRZ03 operator, which
    /// refines H79 by also retaining the constraints of `self` that pin
    /// down `other`'s affine hull.
    pub fn bhrz03_widening_assign(&mut self, other: &Polyhedron) -> Result<()> {
        self.check_binary_compatible(other)?;
        let mut o = other.clone();
        if !o.minimize() {
            return Ok(());
        }
        if !self.minimize() {
            *self = o;
            return Ok(());
        }
        self.constraints = widening::bhrz03(
            &o.constraints,
            &o.generators,
            &self.constraints,
            &self.generators,
            self.space_dim,
            self.topology,
        );
        self.status.set_c_up_to_date(true);
        self.status.set_c_minimized(false);
        self.status.set_g_up_to_date(false);
        self.status.set_sat_c_up_to_date(false);
        Ok(())
    }
}

impl fmt::Display for Polyhedron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.status.is_empty() {
            "empty"
        } else if self.status.c_minimized() && self.status.g_minimized() {
            "minimized"
        } else {
            "lazy"
        };
        write!(
            f,
            "{}",
            Kv::new()
                .with("space_dim", self.space_dim)
                .with("topology", self.topology)
                .with("state", state)
        )
    }
}

/// The image of a generator row under `x_var <- expr / denominator`:
/// evaluate `t = sum_j a_j r_j + b * r_0` on the original row, scale every
/// other coordinate (divisor and epsilon included) by the denominator, and
/// write `t` into the mapped column.
fn affine_image_row(row: &Row, var: Variable, expr: &LinearExpression, denominator: &Coefficient) -> Row {
    let col = var.index() + 1;
    let mut t = row.coeff(0) * expr.inhomogeneous_term();
    for i in 0..expr.space_dimension() {
        t += &(&expr.coefficient(Variable::new(i)) * row.coeff(i + 1));
    }
    let mut new_row = row.clone();
    for (i, c) in new_row.coefficients_mut().iter_mut().enumerate() {
        if i != col {
            *c = &*c * denominator;
        }
    }
    new_row.coefficients_mut()[col] = t;
    new_row.strong_normalize();
    new_row
}

/// The substitution of `x_var <- expr / denominator` into a constraint
/// row, the mirror direction of [`affine_image_row`]: scale every
/// coefficient by the denominator, zero the mapped column, then fold
/// `expr` in, weighted by the old value of the mapped column.
fn affine_substitute_row(
    row: &Row,
    var: Variable,
    expr: &LinearExpression,
    denominator: &Coefficient,
) -> Row {
    let col = var.index() + 1;
    let old = row.coeff(col).clone();
    let mut new_row = row.clone();
    for c in new_row.coefficients_mut().iter_mut() {
        *c = &*c * denominator;
    }
    new_row.coefficients_mut()[col] = Coefficient::zero();

    let constant_addend = &old * expr.inhomogeneous_term();
    let updated_constant = &new_row.coefficients()[0] + &constant_addend;
    new_row.coefficients_mut()[0] = updated_constant;

    for i in 0..expr.space_dimension() {
        let target = i + 1;
        let addend = &old * &expr.coefficient(Variable::new(i));
        let updated = &new_row.coefficients()[target] + &addend;
        new_row.coefficients_mut()[target] = updated;
    }
    new_row.strong_normalize();
    new_row
}

/// Every constraint of `cs` as non-strict or strict inequalities only:
/// equalities split into their two sides. Used by the hull-exactness
/// check, where "the violated side of a constraint" must be a half-space.
fn side_inequalities(cs: &ConstraintSystem) -> Vec<Constraint> {
    let mut out = Vec::new();
    for c in cs.iter() {
        if c.is_equality() {
            let mut fwd = c.into_row();
            fwd.set_kind(RowKind::NonStrictInequality);
            let mut bwd = fwd.clone();
            bwd.negate();
            out.push(Constraint(fwd));
            out.push(Constraint(bwd));
        } else {
            out.push(c);
        }
    }
    out
}

/// The constraint carving out the region where `c` is violated: the
/// negation of `c`, strict iff `c` was not (in a closed topology the open
/// complement is approximated by its closure and the caller compensates
/// with a saturation check).
fn violation_of(c: &Constraint, topology: Topology) -> Constraint {
    let r = c.row();
    let eps = r.epsilon_index();
    let width = eps.unwrap_or(r.len());
    let mut coeffs: Vec<Coefficient> = (0..width).map(|i| -r.coeff(i)).collect();
    let kind = match (r.kind(), topology.is_nnc()) {
        (RowKind::StrictInequality, _) => RowKind::NonStrictInequality,
        (_, true) => RowKind::StrictInequality,
        (_, false) => RowKind::NonStrictInequality,
    };
    if topology.is_nnc() {
        coeffs.push(if kind == RowKind::StrictInequality {
            Coefficient::from_i64(-1)
        } else {
            Coefficient::zero()
        });
    }
    let mut row = Row::new(kind, if topology.is_nnc() { Topology::Nnc } else { Topology::Closed }, coeffs);
    row.strong_normalize();
    Constraint(row)
}

/// Settle a generator row's kind from its content: zero divisor keeps the
/// line/ray distinction already tracked, a positive divisor is a point at
/// positive epsilon height and a closure point at zero.
fn settle_generator_kind(row: &mut Row) {
    let kind = if row.coeff(0).is_zero() {
        if row.kind() == RowKind::Line {
            RowKind::Line
        } else {
            RowKind::Ray
        }
    } else if row.epsilon_index().map_or(true, |e| row.coeff(e).is_positive()) {
        RowKind::Point
    } else {
        RowKind::ClosurePoint
    };
    row.set_kind(kind);
}

/// Append one saturation column for `new_row` covering the current `dual`.
fn push_saturation_column(sat: &mut BitsetMatrix, dual: &[Row], new_row: &Row) {
    sat.push_column();
    let col = sat.ncols() - 1;
    for (i, d) in dual.iter().enumerate() {
        if new_row.scalar_product(d).is_zero() {
            sat.set(i, col);
        }
    }
}

/// Derive a minimized generator system from a constraint system by folding
/// the constraints one at a time into the generator description of the
/// whole (epsilon-extended) space. Returns `Ok(None)` when the system
/// turns out to be unsatisfiable.
fn generators_from_constraints(
    space_dim: usize,
    topology: Topology,
    constraints: &ConstraintSystem,
    poll: Poll<'_>,
) -> Result<Option<GeneratorSystem>> {
    let total_cols = space_dim + 1 + topology.is_nnc() as usize;

    // Bootstrap: the universe as one point at the origin plus one line per
    // coordinate (epsilon included).
    let mut dual: Vec<Row> = Vec::with_capacity(total_cols);
    let mut origin = vec![Coefficient::zero(); total_cols];
    origin[0] = Coefficient::one();
    dual.push(Row::new(RowKind::Point, topology, origin));
    for i in 1..total_cols {
        let mut coeffs = vec![Coefficient::zero(); total_cols];
        coeffs[i] = Coefficient::one();
        dual.push(Row::new(RowKind::Line, topology, coeffs));
    }
    let mut sat = BitsetMatrix::new(0);
    for _ in &dual {
        sat.push_row();
    }

    // The NNC epsilon slab 0 <= eps <= 1 precedes the user's rows, which
    // are processed in sort order (lines/equalities first).
    let mut to_process: Vec<Row> = Vec::new();
    if topology.is_nnc() {
        let mut eps_nonneg = vec![Coefficient::zero(); total_cols];
        eps_nonneg[total_cols - 1] = Coefficient::one();
        to_process.push(Row::new(RowKind::NonStrictInequality, topology, eps_nonneg));
        let mut eps_bounded = vec![Coefficient::zero(); total_cols];
        eps_bounded[0] = Coefficient::one();
        eps_bounded[total_cols - 1] = Coefficient::from_i64(-1);
        to_process.push(Row::new(RowKind::NonStrictInequality, topology, eps_bounded));
    }
    let mut user_rows: Vec<Row> = constraints.iter().map(|c| c.into_row()).collect();
    user_rows.sort_by(|a, b| a.sort_key_cmp(b));
    to_process.extend(user_rows);

    for c in &to_process {
        if poll.map_or(false, |p| p()) {
            return Err(PplError::Timeout);
        }
        if let ConversionOutcome::Empties = convert_row(c, &mut dual, &mut sat) {
            return Ok(None);
        }
        push_saturation_column(&mut sat, &dual, c);
    }

    for d in &mut dual {
        settle_generator_kind(d);
    }

    // Redundancy pruning needs the positivity distinction alongside the
    // processed columns: rays and lines live at divisor zero, which no
    // explicit constraint row records.
    let mut sat_pos = sat.clone();
    sat_pos.push_column();
    let pos_col = sat_pos.ncols() - 1;
    for (i, d) in dual.iter().enumerate() {
        if d.coeff(0).is_zero() {
            sat_pos.set(i, pos_col);
        }
    }
    let kinds: Vec<RowKind> = dual.iter().map(|d| d.kind()).collect();
    let dead = redundant_rows(&sat_pos, &kinds);

    let mut rows: Vec<Row> = dual
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dead.contains(i))
        .map(|(_, r)| r)
        .collect();
    rows.sort_by(|a, b| a.sort_key_cmp(b));
    let dead_after_reduction = reduce_lines_or_equalities(&mut rows);
    let rows: Vec<Row> = rows
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dead_after_reduction.contains(i))
        .map(|(_, r)| r)
        .collect();

    // A generator system without a genuine point denotes emptiness; for
    // NNC that excludes systems of closure points only.
    if !rows.iter().any(|r| r.kind() == RowKind::Point) {
        return Ok(None);
    }

    let mut gs = GeneratorSystem::new(space_dim, topology);
    for r in rows {
        gs.insert_raw(r);
    }
    gs.linear_system_mut().matrix_mut().sort_rows();
    Ok(Some(gs))
}

/// Derive a minimized constraint system from a generator system with the
/// same conversion that drives the other direction, roles swapped: the
/// destination starts as the identity matrix of equality rows (one per
/// column, epsilon included) and each generator is folded in as a new
/// primary row. Equalities crossed by a generator pivot down to
/// inequalities; what survives at the end are the facets, among them
/// trivial rows (positivity, the epsilon slab) that support every
/// polyhedron of the topology and never reach the caller-visible system.
/// Returns `Ok(None)` when the system has no point and hence denotes the
/// empty polyhedron.
fn constraints_from_generators(
    space_dim: usize,
    topology: Topology,
    generators: &GeneratorSystem,
    poll: Poll<'_>,
) -> Result<Option<ConstraintSystem>> {
    let mut gens: Vec<Row> = generators.iter().map(|g| g.into_row()).collect();
    if !gens.iter().any(|g| g.kind() == RowKind::Point) {
        return Ok(None);
    }
    gens.sort_by(|a, b| a.sort_key_cmp(b));

    let width = space_dim + 1 + topology.is_nnc() as usize;
    let mut dual: Vec<Row> = (0..width)
        .map(|i| {
            let mut coeffs = vec![Coefficient::zero(); width];
            coeffs[i] = Coefficient::one();
            Row::new(RowKind::Equality, topology, coeffs)
        })
        .collect();
    let mut sat = BitsetMatrix::new(0);
    for _ in &dual {
        sat.push_row();
    }

    for g in &gens {
        if poll.map_or(false, |p| p()) {
            return Err(PplError::Timeout);
        }
        if let ConversionOutcome::Empties = convert_row(g, &mut dual, &mut sat) {
            // every candidate constraint was cut away: nothing constrains
            // anything, so the system below comes out empty
            dual.clear();
            sat = BitsetMatrix::new(0);
            break;
        }
        push_saturation_column(&mut sat, &dual, g);
    }

    for d in &mut dual {
        settle_constraint_kind(d);
    }

    let kinds: Vec<RowKind> = dual.iter().map(|d| d.kind()).collect();
    let dead = redundant_rows(&sat, &kinds);
    let mut rows: Vec<Row> = dual
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dead.contains(i))
        .map(|(_, r)| r)
        .collect();
    rows.sort_by(|a, b| a.sort_key_cmp(b));
    let dead_after_reduction = reduce_lines_or_equalities(&mut rows);

    let mut cs = ConstraintSystem::new(space_dim, topology);
    for (i, r) in rows.into_iter().enumerate() {
        if dead_after_reduction.contains(&i) {
            continue;
        }
        // positivity and the epsilon slab constrain no real coordinate
        if r.coefficients()[1..=space_dim].iter().all(|c| c.is_zero()) {
            continue;
        }
        cs.insert(Constraint(r));
    }
    cs.linear_system_mut().matrix_mut().sort_rows();
    Ok(Some(cs))
}

/// An equality pivoted down to an inequality reads its strictness off the
/// epsilon coefficient.
fn settle_constraint_kind(row: &mut Row) {
    if row.kind() == RowKind::NonStrictInequality {
        if let Some(eps) = row.epsilon_index() {
            if row.coeff(eps).is_negative() {
                row.set_kind(RowKind::StrictInequality);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    send_sync_test!(polyhedron, Polyhedron);

    fn var(i: usize) -> Variable {
        Variable::new(i)
    }

    fn x() -> LinearExpression {
        LinearExpression::from_variable(var(0))
    }

    fn y() -> LinearExpression {
        LinearExpression::from_variable(var(1))
    }

    #[test]
    fn universe_is_universe() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        assert!(p.is_universe());
        assert!(!p.is_empty());
        assert_eq!(p.generators().num_lines(), 2);
    }

    #[test]
    fn empty_is_empty() {
        let mut p = Polyhedron::empty(2, Topology::Closed);
        assert!(p.is_empty());
        assert!(p.generators().is_empty());
    }

    #[test]
    fn adding_a_constraint_restricts_the_universe() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        assert!(!p.is_empty());
        assert!(!p.is_universe());
    }

    #[test]
    fn a_strict_inequality_is_rejected_by_a_closed_polyhedron() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        let err = p.add_constraint(Constraint::strict_inequality(x())).unwrap_err();
        assert!(matches!(err, PplError::TopologyIncompatible { .. }));
    }

    #[test]
    fn intersecting_with_the_empty_polyhedron_is_empty() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        let empty = Polyhedron::empty(1, Topology::Closed);
        p.intersection_assign(&empty).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn contradictory_constraints_are_detected() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        let lower = LinearExpression::constant(-1) + x(); // x >= 1
        let upper = -x(); // x <= 0
        p.add_constraint(Constraint::non_strict_inequality(lower)).unwrap();
        p.add_constraint(Constraint::non_strict_inequality(upper)).unwrap();
        assert!(p.is_empty());
        assert!(p.generators().is_empty());
    }

    #[test]
    fn deriving_the_constraint_of_a_point_and_a_ray() {
        let mut gs = GeneratorSystem::new(1, Topology::Closed);
        gs.insert(Generator::point_unit(LinearExpression::zero()));
        gs.insert(Generator::ray(x()));
        let mut p = Polyhedron::from_generators(gs);
        let expected = Constraint::non_strict_inequality(x());
        let cs = p.constraints();
        assert_eq!(cs.len(), 1);
        assert!(cs.iter().any(|c| c == expected));
    }

    #[test]
    fn deriving_the_four_edges_of_a_unit_square() {
        let mut gs = GeneratorSystem::new(2, Topology::Closed);
        gs.insert(Generator::point_unit(LinearExpression::zero()));
        gs.insert(Generator::point_unit(x()));
        gs.insert(Generator::point_unit(y()));
        gs.insert(Generator::point_unit(x() + y()));
        let mut p = Polyhedron::from_generators(gs);
        let cs = p.constraints();
        assert_eq!(cs.len(), 4);
        let wanted = [
            Constraint::non_strict_inequality(x()),
            Constraint::non_strict_inequality(y()),
            Constraint::non_strict_inequality(LinearExpression::constant(1) - x()),
            Constraint::non_strict_inequality(LinearExpression::constant(1) - y()),
        ];
        for want in wanted {
            assert!(cs.iter().any(|c| c == want));
        }
    }

    #[test]
    fn deriving_the_constraints_of_a_bounded_segment() {
        // A segment from (0,0) to (2,0): lies on the line y = 0, bounded
        // between x = 0 and x = 2.
        let mut gs = GeneratorSystem::new(2, Topology::Closed);
        gs.insert(Generator::point_unit(LinearExpression::zero()));
        gs.insert(Generator::point_unit(x() * 2));
        let mut p = Polyhedron::from_generators(gs);
        let cs = p.constraints();
        assert_eq!(cs.num_equalities(), 1);
        assert_eq!(cs.len(), 3);
        let lower = Constraint::non_strict_inequality(x());
        let upper = Constraint::non_strict_inequality(LinearExpression::constant(2) - x());
        assert!(cs.iter().any(|c| c == lower));
        assert!(cs.iter().any(|c| c == upper));
    }

    #[test]
    fn dual_round_trip_is_stable() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        p.add_constraint(Constraint::non_strict_inequality(y())).unwrap();
        p.add_constraint(Constraint::non_strict_inequality(
            LinearExpression::constant(1) - x() - y(),
        ))
        .unwrap();
        p.minimize();
        let via_generators = Polyhedron::from_generators(p.generators.clone());
        let mut q = via_generators;
        let mut p2 = p.clone();
        assert!(p2.equals(&mut q));
    }

    #[test]
    fn nnc_strict_half_line_generators() {
        let mut p = Polyhedron::universe(1, Topology::Nnc);
        p.add_constraint(Constraint::strict_inequality(x())).unwrap();
        let gs = p.generators();
        assert_eq!(gs.len(), 3);
        assert!(gs.iter().any(|g| g == Generator::closure_point(LinearExpression::zero(), 1)));
        assert!(gs.iter().any(|g| g == Generator::point_unit(x())));
        assert!(gs.iter().any(|g| g == Generator::ray(x())));
    }

    #[test]
    fn nnc_open_segment_generators() {
        let mut p = Polyhedron::universe(1, Topology::Nnc);
        p.add_constraint(Constraint::strict_inequality(x())).unwrap();
        p.add_constraint(Constraint::strict_inequality(LinearExpression::constant(1) - x()))
            .unwrap();
        let gs = p.generators();
        assert_eq!(gs.len(), 3);
        assert!(gs.iter().any(|g| g == Generator::closure_point(LinearExpression::zero(), 1)));
        assert!(gs.iter().any(|g| g == Generator::closure_point(x(), 1)));
        assert!(gs.iter().any(|g| g == Generator::point(x(), 2)));
    }

    #[test]
    fn closing_a_strict_half_line_yields_the_closed_one() {
        let mut p = Polyhedron::universe(1, Topology::Nnc);
        p.add_constraint(Constraint::strict_inequality(x())).unwrap();
        assert!(!p.is_topologically_closed());
        p.topological_closure_assign();
        assert!(p.is_topologically_closed());
        let cs = p.constraints();
        assert_eq!(cs.len(), 1);
        assert!(cs.iter().any(|c| c == Constraint::non_strict_inequality(x())));
    }

    #[test]
    fn affine_image_shifts_a_half_line() {
        let mut gs = GeneratorSystem::new(1, Topology::Closed);
        gs.insert(Generator::point_unit(LinearExpression::zero()));
        gs.insert(Generator::ray(x()));
        let mut p = Polyhedron::from_generators(gs);
        // x <- 2x + 3
        p.affine_image(var(0), &(x() * 2 + LinearExpression::constant(3)), &Coefficient::one())
            .unwrap();
        let cs = p.constraints();
        let want = Constraint::non_strict_inequality(LinearExpression::constant(-3) + x());
        assert_eq!(cs.len(), 1);
        assert!(cs.iter().any(|c| c == want));
    }

    #[test]
    fn affine_round_trip_is_identity() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        let original = p.clone();
        let map = x() * 2 + LinearExpression::constant(3);
        p.affine_image(var(0), &map, &Coefficient::one()).unwrap();
        p.affine_preimage(var(0), &map, &Coefficient::one()).unwrap();
        let mut orig = original;
        assert!(p.equals(&mut orig));
    }

    #[test]
    fn embed_then_remove_is_identity() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        p.add_constraint(Constraint::non_strict_inequality(y() * 3 - x())).unwrap();
        let original = p.clone();
        p.add_space_dimensions_and_embed(2).unwrap();
        assert_eq!(p.space_dimension(), 4);
        p.remove_space_dimensions(&[var(2), var(3)]).unwrap();
        assert_eq!(p.space_dimension(), 2);
        let mut orig = original;
        assert!(p.equals(&mut orig));
    }

    #[test]
    fn project_pins_new_dimensions_to_zero() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        p.add_space_dimensions_and_project(1).unwrap();
        let rel = p.relation_with(&Constraint::equality(y()));
        assert!(rel.implies(PolyConRelation::IS_INCLUDED));
        assert!(rel.implies(PolyConRelation::SATURATES));
    }

    #[test]
    fn map_space_dimensions_swaps_coordinates() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        p.map_space_dimensions(&[Some(1), Some(0)]).unwrap();
        let rel = p.relation_with(&Constraint::non_strict_inequality(y()));
        assert!(rel.implies(PolyConRelation::IS_INCLUDED));
        let rel_x = p.relation_with(&Constraint::non_strict_inequality(x()));
        assert!(rel_x.implies(PolyConRelation::STRICTLY_INTERSECTS));
    }

    #[test]
    fn expand_space_dimension_copies_constraints() {
        let mut p = Polyhedron::universe(1, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        p.expand_space_dimension(var(0), 1).unwrap();
        assert_eq!(p.space_dimension(), 2);
        let rel = p.relation_with(&Constraint::non_strict_inequality(y()));
        assert!(rel.implies(PolyConRelation::IS_INCLUDED));
    }

    #[test]
    fn fold_space_dimensions_hulls_the_images() {
        // x in [1, 2], y in [3, 4]; folding y into x gives x in [1, 4].
        let mut p = Polyhedron::from_box(
            &[
                (Some(Coefficient::from_i64(1)), Some(Coefficient::from_i64(2))),
                (Some(Coefficient::from_i64(3)), Some(Coefficient::from_i64(4))),
            ],
            Topology::Closed,
        )
        .unwrap();
        p.fold_space_dimensions(&[var(1)], var(0)).unwrap();
        assert_eq!(p.space_dimension(), 1);
        let mut want = Polyhedron::from_box(
            &[(Some(Coefficient::from_i64(1)), Some(Coefficient::from_i64(4)))],
            Topology::Closed,
        )
        .unwrap();
        assert!(p.equals(&mut want));
    }

    #[test]
    fn concatenate_stacks_independent_blocks() {
        let mut p = Polyhedron::from_box(
            &[(Some(Coefficient::from_i64(0)), Some(Coefficient::from_i64(1)))],
            Topology::Closed,
        )
        .unwrap();
        let q = Polyhedron::from_box(
            &[(Some(Coefficient::from_i64(5)), None)],
            Topology::Closed,
        )
        .unwrap();
        p.concatenate_assign(&q).unwrap();
        assert_eq!(p.space_dimension(), 2);
        let rel = p.relation_with(&Constraint::non_strict_inequality(
            LinearExpression::constant(-5) + y(),
        ));
        assert!(rel.implies(PolyConRelation::IS_INCLUDED));
        let rel_x = p.relation_with(&Constraint::non_strict_inequality(
            LinearExpression::constant(1) - x(),
        ));
        assert!(rel_x.implies(PolyConRelation::IS_INCLUDED));
    }

    #[test]
    fn adding_a_ray_to_an_empty_polyhedron_is_a_no_op() {
        let mut p = Polyhedron::empty(1, Topology::Closed);
        p.add_generator(Generator::ray(x())).unwrap();
        assert!(p.is_empty());
        p.add_generator(Generator::point_unit(x())).unwrap();
        assert!(!p.is_empty());
    }

    #[test]
    fn poly_hull_covers_both_operands() {
        let mut p = Polyhedron::from_box(
            &[(Some(Coefficient::from_i64(0)), Some(Coefficient::from_i64(1)))],
            Topology::Closed,
        )
        .unwrap();
        let mut q = Polyhedron::from_box(
            &[(Some(Coefficient::from_i64(3)), Some(Coefficient::from_i64(4)))],
            Topology::Closed,
        )
        .unwrap();
        let mut hull = p.clone();
        hull.poly_hull_assign(&q).unwrap();
        assert!(hull.contains(&mut p));
        assert!(hull.contains(&mut q));
        assert!(!p.contains(&mut hull));
    }

    #[test]
    fn hull_of_two_points_is_not_exact() {
        let mut gs_p = GeneratorSystem::new(2, Topology::Closed);
        gs_p.insert(Generator::point_unit(LinearExpression::zero()));
        let mut p = Polyhedron::from_generators(gs_p);
        let mut gs_q = GeneratorSystem::new(2, Topology::Closed);
        gs_q.insert(Generator::point_unit(x() * 2));
        let q = Polyhedron::from_generators(gs_q);
        let before = p.clone();
        assert!(!p.poly_hull_assign_if_exact(&q).unwrap());
        let mut before = before;
        assert!(p.equals(&mut before));
    }

    #[test]
    fn hull_of_overlapping_half_lines_is_exact() {
        let mut p = Polyhedron::from_box(&[(Some(Coefficient::zero()), None)], Topology::Closed).unwrap();
        let q = Polyhedron::from_box(&[(None, Some(Coefficient::one()))], Topology::Closed).unwrap();
        assert!(p.poly_hull_assign_if_exact(&q).unwrap());
        assert!(p.is_universe());
    }

    #[test]
    fn relation_with_a_crossing_constraint_strictly_intersects() {
        let mut gs = GeneratorSystem::new(1, Topology::Closed);
        gs.insert(Generator::point_unit(LinearExpression::zero()));
        gs.insert(Generator::ray(x()));
        let mut p = Polyhedron::from_generators(gs);
        // x >= 5
        let c = Constraint::non_strict_inequality(LinearExpression::constant(-5) + x());
        let rel = p.relation_with(&c);
        assert!(rel.implies(PolyConRelation::STRICTLY_INTERSECTS));
        assert!(!rel.implies(PolyConRelation::IS_INCLUDED));
    }

    #[test]
    fn relation_with_generator_detects_subsumption() {
        let mut p = Polyhedron::from_box(&[(Some(Coefficient::zero()), None)], Topology::Closed).unwrap();
        assert_eq!(
            p.relation_with_generator(&Generator::point_unit(x())),
            PolyGenRelation::SUBSUMES
        );
        let mut outside = LinearExpression::zero();
        outside.set_coefficient(var(0), Coefficient::from_i64(-1));
        assert_eq!(
            p.relation_with_generator(&Generator::point_unit(outside)),
            PolyGenRelation::nothing()
        );
    }

    #[test]
    fn saturation_matrices_are_transposes() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        p.add_constraint(Constraint::non_strict_inequality(y())).unwrap();
        p.minimize();
        let sat_c = p.saturation_by_generators().clone();
        let sat_g = p.saturation_by_constraints().clone();
        assert_eq!(sat_c.transpose(), sat_g);
        // every saturation bit matches a vanishing scalar product
        for (i, g) in p.generators.iter().enumerate() {
            for (j, c) in p.constraints.iter().enumerate() {
                let sp_zero = c.row().scalar_product(g.row()).is_zero();
                assert_eq!(sat_c.test(i, j), sp_zero);
            }
        }
    }

    #[test]
    fn minimize_with_timeout_fires_before_mutation() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        let result = p.minimize_with_timeout(&|| true);
        assert!(matches!(result, Err(PplError::Timeout)));
        // the polyhedron is still usable and semantically unchanged
        assert!(!p.is_empty());
    }

    #[test]
    fn zero_dimension_universe_has_one_point() {
        let mut p = Polyhedron::universe(0, Topology::Closed);
        assert!(p.is_universe());
        let gs = p.generators();
        assert_eq!(gs.len(), 1);
        assert!(gs.get(0).is_point());
    }

    #[test]
    fn with_topology_round_trips_a_closed_polyhedron() {
        let mut p = Polyhedron::from_box(
            &[(Some(Coefficient::zero()), Some(Coefficient::one()))],
            Topology::Closed,
        )
        .unwrap();
        let nnc = p.with_topology(Topology::Nnc).unwrap();
        let mut back = nnc.with_topology(Topology::Closed).unwrap();
        assert!(p.equals(&mut back));
    }

    #[test]
    fn with_topology_refuses_to_close_an_open_set() {
        let mut p = Polyhedron::universe(1, Topology::Nnc);
        p.add_constraint(Constraint::strict_inequality(x())).unwrap();
        assert!(matches!(
            p.with_topology(Topology::Closed),
            Err(PplError::TopologyIncompatible { .. })
        ));
    }
}
