// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Constraints: equalities and (non-)strict inequalities over a
//! [`LinearExpression`], plus the `Variable`/`LinearExpression` builder
//! types used to construct them (spec.md §4.7 supplement).

use crate::bigint::Coefficient;
use crate::generator::Generator;
use crate::row::{Row, RowKind, Topology};
use std::ops::{Add, Mul, Neg, Sub};

/// A named problem dimension, `x_0, x_1, ...`. Cheap to copy; carries only
/// an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Variable(usize);

impl Variable {
    /// The variable at zero-based `index`.
    pub fn new(index: usize) -> Self {
        Variable(index)
    }

    /// This variable's index.
    pub fn index(&self) -> usize {
        self.0
    }

    /// The smallest space dimension a polyhedron needs to mention this
    /// variable, i.e. `index + 1`.
    pub fn space_dimension(&self) -> usize {
        self.0 + 1
    }
}

/// A linear combination `c + a_0 x_0 + a_1 x_1 + ...` with integer
/// coefficients, used to build [`Constraint`]s and `Generator`s without
/// naming a space dimension up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearExpression {
    inhomogeneous: Coefficient,
    coefficients: Vec<Coefficient>,
}

impl LinearExpression {
    /// The constant zero expression.
    pub fn zero() -> Self {
        LinearExpression {
            inhomogeneous: Coefficient::zero(),
            coefficients: Vec::new(),
        }
    }

    /// The expression consisting of the constant `c` alone.
    pub fn constant(c: i64) -> Self {
        LinearExpression {
            inhomogeneous: Coefficient::from_i64(c),
            coefficients: Vec::new(),
        }
    }

    /// The expression `v` alone, with coefficient 1.
    pub fn from_variable(v: Variable) -> Self {
        let mut e = LinearExpression::zero();
        e.set_coefficient(v, Coefficient::one());
        e
    }

    /// The space dimension this expression mentions, i.e. one plus the
    /// highest variable index with a non-zero coefficient (0 if none).
    pub fn space_dimension(&self) -> usize {
        self.coefficients.len()
    }

    /// The constant term.
    pub fn inhomogeneous_term(&self) -> &Coefficient {
        &self.inhomogeneous
    }

    /// The coefficient of `v`, zero if never set.
    pub fn coefficient(&self, v: Variable) -> Coefficient {
        self.coefficients.get(v.index()).cloned().unwrap_or_else(Coefficient::zero)
    }

    /// Set the constant term.
    pub fn set_inhomogeneous_term(&mut self, c: Coefficient) {
        self.inhomogeneous = c;
    }

    /// Set the coefficient of `v`, growing the expression if necessary.
    pub fn set_coefficient(&mut self, v: Variable, c: Coefficient) {
        if v.index() >= self.coefficients.len() {
            self.coefficients.resize(v.index() + 1, Coefficient::zero());
        }
        self.coefficients[v.index()] = c;
    }

    fn coefficients_up_to(&self, dim: usize) -> Vec<Coefficient> {
        (0..dim)
            .map(|i| self.coefficients.get(i).cloned().unwrap_or_else(Coefficient::zero))
            .collect()
    }
}

impl Add for LinearExpression {
    type Output = LinearExpression;
    fn add(self, rhs: LinearExpression) -> LinearExpression {
        let dim = self.space_dimension().max(rhs.space_dimension());
        let mut out = LinearExpression {
            inhomogeneous: &self.inhomogeneous + &rhs.inhomogeneous,
            coefficients: Vec::with_capacity(dim),
        };
        for i in 0..dim {
            out.coefficients.push(&self.coefficient(Variable(i)) + &rhs.coefficient(Variable(i)));
        }
        out
    }
}

impl Sub for LinearExpression {
    type Output = LinearExpression;
    fn sub(self, rhs: LinearExpression) -> LinearExpression {
        self + (-rhs)
    }
}

impl Neg for LinearExpression {
    type Output = LinearExpression;
    fn neg(self) -> LinearExpression {
        LinearExpression {
            inhomogeneous: -self.inhomogeneous,
            coefficients: self.coefficients.into_iter().map(|c| -c).collect(),
        }
    }
}

impl Mul<i64> for LinearExpression {
    type Output = LinearExpression;
    fn mul(self, rhs: i64) -> LinearExpression {
        let k = Coefficient::from_i64(rhs);
        LinearExpression {
            inhomogeneous: &self.inhomogeneous * &k,
            coefficients: self.coefficients.iter().map(|c| c * &k).collect(),
        }
    }
}

/// A linear equality or (non-)strict inequality: `expr = 0`, `expr >= 0` or
/// `expr > 0`, stored as a single closed or NNC [`Row`].
///
/// A strict inequality `expr > 0` is stored as the non-strict
/// `expr - eps >= 0` over the extended column vector, i.e. with an epsilon
/// coefficient of -1 (spec'd in §3 of the data model).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint(pub(crate) Row);

impl Constraint {
    fn from_expression(kind: RowKind, e: &LinearExpression, dim: usize) -> Self {
        let mut coeffs = Vec::with_capacity(dim + 1);
        coeffs.push(e.inhomogeneous_term().clone());
        coeffs.extend(e.coefficients_up_to(dim));
        let topology = if kind == RowKind::StrictInequality {
            Topology::Nnc
        } else {
            Topology::Closed
        };
        if topology.is_nnc() {
            coeffs.push(Coefficient::from_i64(-1));
        }
        let mut row = Row::new(kind, topology, coeffs);
        row.strong_normalize();
        Constraint(row)
    }

    /// `e = 0`.
    pub fn equality(e: LinearExpression) -> Self {
        let dim = e.space_dimension();
        Constraint::from_expression(RowKind::Equality, &e, dim)
    }

    /// `e >= 0`.
    pub fn non_strict_inequality(e: LinearExpression) -> Self {
        let dim = e.space_dimension();
        Constraint::from_expression(RowKind::NonStrictInequality, &e, dim)
    }

    /// `e > 0`.
    pub fn strict_inequality(e: LinearExpression) -> Self {
        let dim = e.space_dimension();
        Constraint::from_expression(RowKind::StrictInequality, &e, dim)
    }

    /// The space dimension this constraint is stated over.
    pub fn space_dimension(&self) -> usize {
        self.0.len() - 1 - self.0.topology().is_nnc() as usize
    }

    /// `true` iff this is `expr = 0`.
    pub fn is_equality(&self) -> bool {
        self.0.kind() == RowKind::Equality
    }

    /// `true` iff this is `expr >= 0`.
    pub fn is_non_strict_inequality(&self) -> bool {
        self.0.kind() == RowKind::NonStrictInequality
    }

    /// `true` iff this is `expr > 0`.
    pub fn is_strict_inequality(&self) -> bool {
        self.0.kind() == RowKind::StrictInequality
    }

    /// `true` iff this constraint mentions an epsilon column, i.e. lives in
    /// an NNC context.
    pub fn is_nnc(&self) -> bool {
        self.0.topology().is_nnc()
    }

    /// The constant term.
    pub fn inhomogeneous_term(&self) -> &Coefficient {
        self.0.coeff(0)
    }

    /// The coefficient of `v`.
    pub fn coefficient(&self, v: Variable) -> &Coefficient {
        self.0.coeff(v.index() + 1)
    }

    /// Whether the generator `g` satisfies this constraint: a line must
    /// saturate it, a point must be on the strictly positive side of a
    /// strict inequality, and rays and closure points only need the
    /// non-negative side (a closure point may sit on a strict boundary; a
    /// ray along it never leaves the satisfied half-space).
    pub fn is_satisfied_by(&self, g: &Generator) -> bool {
        let sp = self.0.reduced_scalar_product(g.row());
        if g.is_line() {
            return sp.is_zero();
        }
        match self.0.kind() {
            RowKind::Equality => sp.is_zero(),
            RowKind::StrictInequality if g.is_point() => sp.is_positive(),
            _ => !sp.is_negative(),
        }
    }

    pub(crate) fn row(&self) -> &Row {
        &self.0
    }

    pub(crate) fn into_row(self) -> Row {
        self.0
    }
}

/// Constraints compare semantically: same kind, same inhomogeneous term,
/// and the same homogeneous coefficients once the shorter row is padded
/// with zeros. The epsilon column is a representation detail (strictness is
/// already the kind) and does not participate.
impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
            && self.inhomogeneous_term() == other.inhomogeneous_term()
            && homogeneous_parts_equal(&self.0, &other.0)
    }
}

impl Eq for Constraint {}

pub(crate) fn homogeneous_parts_equal(a: &Row, b: &Row) -> bool {
    let a_end = a.epsilon_index().unwrap_or(a.len());
    let b_end = b.epsilon_index().unwrap_or(b.len());
    let zero = Coefficient::zero();
    (1..a_end.max(b_end)).all(|i| {
        let x = if i < a_end { a.coeff(i) } else { &zero };
        let y = if i < b_end { b.coeff(i) } else { &zero };
        x == y
    })
}
