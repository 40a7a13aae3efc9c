// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! ppl-polyhedra is a library for exact manipulation of convex polyhedra
//! over the rationals, written entirely in Rust.
//!
//! A polyhedron is kept as a *double description*: a system of linear
//! constraints and a system of generators (points, closure points, rays
//! and lines) describing the same set, each derived from the other on
//! demand by a Chernikova-style conversion and minimised by a
//! saturation-based simplification. All arithmetic is exact
//! arbitrary-precision integer arithmetic; rationals only ever appear as
//! `(numerator, divisor)` pairs inside individual rows.
//!
//! Both *necessarily closed* polyhedra (non-strict inequalities only) and
//! *not necessarily closed* (NNC) polyhedra (strict inequalities and
//! closure points admitted) are supported; NNC polyhedra are handled
//! through an extra epsilon dimension so that the closed machinery covers
//! both [`Topology`] variants.
//!
//! # Example
//!
//! ```
//! use ppl_polyhedra::{Constraint, LinearExpression, Polyhedron, Topology, Variable};
//!
//! let x = Variable::new(0);
//! let y = Variable::new(1);
//!
//! // The triangle x >= 0, y >= 0, x + y <= 1.
//! let mut triangle = Polyhedron::universe(2, Topology::Closed);
//! triangle
//!     .add_constraint(Constraint::non_strict_inequality(LinearExpression::from_variable(x)))
//!     .unwrap();
//! triangle
//!     .add_constraint(Constraint::non_strict_inequality(LinearExpression::from_variable(y)))
//!     .unwrap();
//! triangle
//!     .add_constraint(Constraint::non_strict_inequality(
//!         LinearExpression::constant(1)
//!             - LinearExpression::from_variable(x)
//!             - LinearExpression::from_variable(y),
//!     ))
//!     .unwrap();
//!
//! assert!(!triangle.is_empty());
//! assert_eq!(triangle.generators().len(), 3); // its three corners
//! ```
//!
//! # Operations
//!
//! Beyond construction from constraints, generators or boxes,
//! [`Polyhedron`] offers intersection, poly-hull (with an exactness
//! check), affine images and preimages, the space-dimension algebra
//! (embed, project, remove, map, expand, fold, concatenate), relation
//! tests against single constraints and generators, containment and
//! equality, topological closure, and the H79 and BHRZ03 widenings.
//!
//! A polyhedron is a passive data structure: nothing here spawns threads,
//! blocks or performs I/O. Methods that may trigger the lazy conversion
//! take `&mut self`; after [`Polyhedron::minimize`] read-only inspection
//! is safe. Callers with a watchdog can use
//! [`Polyhedron::minimize_with_timeout`], whose poll hook aborts the
//! conversion before any observable state changes.
//!
//! # License
//!
//! Licensed under either of the Apache License, Version 2.0 or the MIT
//! license, at your option.

#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod bigint;
pub mod bitset;
pub mod constraint;
pub mod constraint_system;
pub mod conversion;
pub mod error;
pub mod generator;
pub mod generator_system;
pub mod kv;
pub mod linear_system;
pub mod matrix;
pub mod polyhedron;
pub mod relation;
pub mod row;
pub mod saturation;
pub mod serialize;
pub mod simplify;
pub mod status;
pub mod widening;

pub use crate::bigint::Coefficient;
pub use crate::constraint::{Constraint, LinearExpression, Variable};
pub use crate::constraint_system::ConstraintSystem;
pub use crate::error::{PplError, Result};
pub use crate::generator::Generator;
pub use crate::generator_system::GeneratorSystem;
pub use crate::polyhedron::Polyhedron;
pub use crate::relation::{PolyConRelation, PolyGenRelation};
pub use crate::row::Topology;

/// The largest space dimension any polyhedron may have: every row needs
/// `dimension + 2` columns (the inhomogeneous term and possibly epsilon),
/// so the limit keeps column indices representable.
pub fn max_space_dimension() -> usize {
    usize::MAX - 2
}

/// Library-level configuration.
///
/// The core needs no runtime configuration to operate; this mirrors the
/// tunables a host application may want to consult or adjust before
/// interfacing the library with inexact data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    max_space_dimension: usize,
    irrational_precision: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_space_dimension: max_space_dimension(),
            irrational_precision: 128,
        }
    }
}

impl Config {
    /// The largest admissible space dimension.
    pub fn max_space_dimension(&self) -> usize {
        self.max_space_dimension
    }

    /// Bits of precision used when irrational values must be approximated
    /// on input or output. The exact core never rounds; this only matters
    /// to float import/export layers built on top.
    pub fn irrational_precision(&self) -> u32 {
        self.irrational_precision
    }

    /// Adjust the irrational-approximation precision.
    pub fn with_irrational_precision(mut self, bits: u32) -> Self {
        self.irrational_precision = bits;
        self
    }
}
