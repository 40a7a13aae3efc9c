// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The bit-flag relations a single constraint holds with a generator (or
//! vice versa): [`PolyConRelation`] and [`PolyGenRelation`] (spec.md §4.7
//! supplement, grounded on the saturation test of spec.md §4.3).

use std::ops::{BitOr, BitOrAssign};

macro_rules! relation_flags {
    ($(#[$meta:meta])* $name:ident { $($flag:ident = $bit:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name(u8);

        impl $name {
            $(
                #[doc = concat!("The `", stringify!($flag), "` relation bit.")]
                pub const $flag: $name = $name($bit);
            )+

            /// The empty relation (neither side says anything about the
            /// other).
            pub fn nothing() -> Self {
                $name(0)
            }

            /// `true` iff every bit set in `other` is also set in `self`.
            pub fn implies(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: Self) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

relation_flags!(
    /// How a polyhedron relates to a single constraint.
    PolyConRelation {
        IS_DISJOINT = 1 << 0,
        STRICTLY_INTERSECTS = 1 << 1,
        IS_INCLUDED = 1 << 2,
        SATURATES = 1 << 3,
    }
);

relation_flags!(
    /// How a polyhedron relates to a single generator.
    PolyGenRelation {
        SUBSUMES = 1 << 0,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combining_flags_is_implied_by_each_part() {
        let r = PolyConRelation::IS_INCLUDED | PolyConRelation::SATURATES;
        assert!(r.implies(PolyConRelation::IS_INCLUDED));
        assert!(r.implies(PolyConRelation::SATURATES));
        assert!(!r.implies(PolyConRelation::IS_DISJOINT));
    }

    #[test]
    fn nothing_implies_only_itself() {
        let r = PolyConRelation::nothing();
        assert!(r.implies(PolyConRelation::nothing()));
        assert!(!r.implies(PolyConRelation::IS_DISJOINT));
    }
}
