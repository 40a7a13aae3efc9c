// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Errors

use thiserror::Error;

/// Error type returned by fallible operations on [`crate::Polyhedron`] and the
/// systems/rows it is built from.
///
/// Operations on an already-empty polyhedron are never errors: most queries
/// return trivially and most mutations are no-ops that preserve emptiness.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PplError {
    /// A requested space dimension exceeds what the implementation can
    /// represent.
    #[error("space dimension overflow: requested {requested}, limit is {limit}")]
    SpaceDimensionOverflow {
        /// Requested dimension
        requested: usize,
        /// Implementation limit
        limit: usize,
    },

    /// A binary operation was attempted between polyhedra of different
    /// space dimensions.
    #[error("dimension mismatch: left has dimension {left}, right has dimension {right}")]
    DimensionIncompatible {
        /// Space dimension of the left-hand operand
        left: usize,
        /// Space dimension of the right-hand operand
        right: usize,
    },

    /// A closed-topology context received a strict inequality or closure
    /// point, or an NNC-only operation was applied to a closed polyhedron
    /// in a context that forbids promotion.
    #[error("topology incompatible: {text}")]
    TopologyIncompatible {
        /// Description of the offending operation
        text: String,
    },

    /// A malformed row was supplied: a point/closure-point with divisor
    /// zero or negative, a mis-signed denominator, or an empty linear
    /// expression where one is required.
    #[error("invalid argument: {text}")]
    InvalidArgument {
        /// Description of the problem
        text: String,
    },

    /// A coefficient could not be represented in the concrete integer type
    /// of the caller's binding.
    #[error("coefficient out of representable range: {text}")]
    CoefficientOutOfRange {
        /// Description of the problem
        text: String,
    },

    /// An external watchdog signalled that the operation must be aborted.
    /// No observable mutation has taken place.
    #[error("operation timed out")]
    Timeout,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PplError>;
