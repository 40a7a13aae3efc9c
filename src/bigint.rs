// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Arbitrary-precision signed coefficients.
//!
//! [`Coefficient`] is a thin wrapper around [`num_bigint::BigInt`] adding the
//! exact-division, gcd and lcm primitives the double-description engine
//! relies on. All arithmetic in this crate is exact; no coefficient is ever
//! rounded or truncated.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// An arbitrary-precision signed integer coefficient.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Coefficient(BigInt);

impl Coefficient {
    /// The additive identity.
    pub fn zero() -> Self {
        Coefficient(BigInt::zero())
    }

    /// The multiplicative identity.
    pub fn one() -> Self {
        Coefficient(BigInt::one())
    }

    /// Build a coefficient from any type that converts into a primitive
    /// signed integer, e.g. `Coefficient::from_i64(-3)`.
    pub fn from_i64(v: i64) -> Self {
        Coefficient(BigInt::from(v))
    }

    /// `true` iff this coefficient is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `true` iff this coefficient is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// `true` iff this coefficient is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// `-1`, `0` or `1` according to the sign of `self`.
    pub fn signum(&self) -> i32 {
        if self.is_zero() {
            0
        } else if self.is_positive() {
            1
        } else {
            -1
        }
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Coefficient(self.0.abs())
    }

    /// The non-negative greatest common divisor of `self` and `other`.
    /// `gcd(0, 0) = 0`, matching the convention used by strong
    /// normalisation (a row of all zeros is never strongly normalised, so
    /// callers never actually divide by this case).
    pub fn gcd(&self, other: &Self) -> Self {
        Coefficient(self.0.gcd(&other.0))
    }

    /// The non-negative least common multiple of `self` and `other`.
    pub fn lcm(&self, other: &Self) -> Self {
        Coefficient(self.0.lcm(&other.0))
    }

    /// Divide `self` by `other`, which must divide `self` exactly.
    ///
    /// # Panics
    /// Panics (a logic error, per the component design in spec.md §9) if
    /// `other` does not evenly divide `self`, or if `other` is zero.
    pub fn exact_div(&self, other: &Self) -> Self {
        assert!(!other.is_zero(), "exact_div by zero");
        let (q, r) = self.0.div_rem(&other.0);
        assert!(r.is_zero(), "exact_div: {self:?} is not a multiple of {other:?}");
        Coefficient(q)
    }

    /// Access the underlying `BigInt`.
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }
}

impl From<i64> for Coefficient {
    fn from(v: i64) -> Self {
        Coefficient::from_i64(v)
    }
}

impl std::str::FromStr for Coefficient {
    type Err = num_bigint::ParseBigIntError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<BigInt>().map(Coefficient)
    }
}

impl From<BigInt> for Coefficient {
    fn from(v: BigInt) -> Self {
        Coefficient(v)
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for &Coefficient {
    type Output = Coefficient;
    fn add(self, rhs: Self) -> Coefficient {
        Coefficient(&self.0 + &rhs.0)
    }
}

impl Sub for &Coefficient {
    type Output = Coefficient;
    fn sub(self, rhs: Self) -> Coefficient {
        Coefficient(&self.0 - &rhs.0)
    }
}

impl Mul for &Coefficient {
    type Output = Coefficient;
    fn mul(self, rhs: Self) -> Coefficient {
        Coefficient(&self.0 * &rhs.0)
    }
}

impl Neg for &Coefficient {
    type Output = Coefficient;
    fn neg(self) -> Coefficient {
        Coefficient(-&self.0)
    }
}

impl Neg for Coefficient {
    type Output = Coefficient;
    fn neg(self) -> Coefficient {
        Coefficient(-self.0)
    }
}

impl AddAssign<&Coefficient> for Coefficient {
    fn add_assign(&mut self, rhs: &Coefficient) {
        self.0 += &rhs.0;
    }
}

impl Sum for Coefficient {
    fn sum<I: Iterator<Item = Coefficient>>(iter: I) -> Self {
        iter.fold(Coefficient::zero(), |acc, x| &acc + &x)
    }
}
