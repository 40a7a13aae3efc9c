// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Generators: lines, rays, points and closure points, each stored as a
//! `(divisor, coefficients)` row with the divisor in column 0 (spec.md
//! §3, §4.7 supplement).

use crate::bigint::Coefficient;
use crate::constraint::{LinearExpression, Variable};
use crate::row::{Row, RowKind, Topology};

/// A line, ray, point or closure point generator.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Generator(pub(crate) Row);

/// Generators compare semantically: same kind, same divisor, and the same
/// coordinates once the shorter row is padded with zeros. The epsilon
/// column does not participate (whether a point is a point or a closure
/// point is already the kind).
impl PartialEq for Generator {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
            && self.divisor() == other.divisor()
            && crate::constraint::homogeneous_parts_equal(&self.0, &other.0)
    }
}

impl Eq for Generator {}

impl Generator {
    fn from_expression(kind: RowKind, e: &LinearExpression, divisor: Coefficient, dim: usize) -> Self {
        let topology = if kind == RowKind::ClosurePoint {
            Topology::Nnc
        } else {
            Topology::Closed
        };
        let mut coeffs = Vec::with_capacity(dim + 1);
        coeffs.push(divisor);
        for i in 0..dim {
            coeffs.push(e.coefficient(Variable::new(i)));
        }
        if topology.is_nnc() {
            coeffs.push(Coefficient::zero());
        }
        let mut row = Row::new(kind, topology, coeffs);
        row.strong_normalize();
        Generator(row)
    }

    /// The point `e / divisor`; `divisor` must be strictly positive.
    pub fn point(e: LinearExpression, divisor: i64) -> Self {
        assert!(divisor > 0, "a point's divisor must be strictly positive");
        let dim = e.space_dimension();
        Generator::from_expression(RowKind::Point, &e, Coefficient::from_i64(divisor), dim)
    }

    /// The point `e` with an implicit divisor of 1.
    pub fn point_unit(e: LinearExpression) -> Self {
        Generator::point(e, 1)
    }

    /// The closure point `e / divisor`, only meaningful in an NNC context.
    pub fn closure_point(e: LinearExpression, divisor: i64) -> Self {
        assert!(divisor > 0, "a closure point's divisor must be strictly positive");
        let dim = e.space_dimension();
        Generator::from_expression(RowKind::ClosurePoint, &e, Coefficient::from_i64(divisor), dim)
    }

    /// The ray in direction `e`, which must not be the zero vector.
    pub fn ray(e: LinearExpression) -> Self {
        let dim = e.space_dimension();
        Generator::from_expression(RowKind::Ray, &e, Coefficient::zero(), dim)
    }

    /// The line through the origin in direction `e`, which must not be the
    /// zero vector.
    pub fn line(e: LinearExpression) -> Self {
        let dim = e.space_dimension();
        Generator::from_expression(RowKind::Line, &e, Coefficient::zero(), dim)
    }

    /// The space dimension this generator is stated over.
    pub fn space_dimension(&self) -> usize {
        self.0.len() - 1 - self.0.topology().is_nnc() as usize
    }

    /// `true` for [`RowKind::Line`].
    pub fn is_line(&self) -> bool {
        self.0.kind() == RowKind::Line
    }

    /// `true` for [`RowKind::Ray`].
    pub fn is_ray(&self) -> bool {
        self.0.kind() == RowKind::Ray
    }

    /// `true` for [`RowKind::Point`].
    pub fn is_point(&self) -> bool {
        self.0.kind() == RowKind::Point
    }

    /// `true` for [`RowKind::ClosurePoint`].
    pub fn is_closure_point(&self) -> bool {
        self.0.kind() == RowKind::ClosurePoint
    }

    /// The divisor (column 0); zero for lines and rays.
    pub fn divisor(&self) -> &Coefficient {
        self.0.coeff(0)
    }

    /// The coefficient of `v`.
    pub fn coefficient(&self, v: Variable) -> &Coefficient {
        self.0.coeff(v.index() + 1)
    }

    pub(crate) fn row(&self) -> &Row {
        &self.0
    }

    pub(crate) fn into_row(self) -> Row {
        self.0
    }
}
