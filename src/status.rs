// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The lazy-orchestration status bits a [`crate::polyhedron::Polyhedron`]
//! carries: which of its two representations are up to date, minimized, and
//! whether the saturation matrices can be trusted (spec.md §4.6).

const ZERO_DIM_UNIV: u8 = 1 << 0;
const EMPTY: u8 = 1 << 1;
const C_UP_TO_DATE: u8 = 1 << 2;
const G_UP_TO_DATE: u8 = 1 << 3;
const C_MINIMIZED: u8 = 1 << 4;
const G_MINIMIZED: u8 = 1 << 5;
const SAT_C_UP_TO_DATE: u8 = 1 << 6;
const SAT_G_UP_TO_DATE: u8 = 1 << 7;

/// The bit-set of flags spec.md §4.6 assigns to a polyhedron. `Default`
/// yields the zero-dimension universe status, matching a freshly
/// constructed trivial polyhedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(u8);

impl Default for Status {
    fn default() -> Self {
        Status(ZERO_DIM_UNIV | C_UP_TO_DATE | G_UP_TO_DATE | C_MINIMIZED | G_MINIMIZED)
    }
}

impl Status {
    /// The status of a polyhedron known, a priori, to be empty.
    pub fn empty() -> Self {
        Status(EMPTY | C_UP_TO_DATE | C_MINIMIZED)
    }

    fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    fn set(&mut self, bit: u8, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    /// `true` iff this is the distinguished zero-dimension universe.
    pub fn is_zero_dim_univ(self) -> bool {
        self.has(ZERO_DIM_UNIV)
    }

    /// `true` iff this polyhedron is known to be empty.
    pub fn is_empty(self) -> bool {
        self.has(EMPTY)
    }

    /// Mark (or unmark) this polyhedron as known-empty; marking it clears
    /// every other flag since an empty polyhedron has no meaningful
    /// generator representation.
    pub fn set_empty(&mut self, value: bool) {
        if value {
            self.0 = EMPTY | C_UP_TO_DATE | C_MINIMIZED;
        } else {
            self.set(EMPTY, false);
        }
    }

    /// `true` iff the constraint system reflects the polyhedron's current
    /// content (may still contain redundancies).
    pub fn c_up_to_date(self) -> bool {
        self.has(C_UP_TO_DATE)
    }

    /// `true` iff the generator system reflects the polyhedron's current
    /// content.
    pub fn g_up_to_date(self) -> bool {
        self.has(G_UP_TO_DATE)
    }

    /// `true` iff the constraint system is up to date and irredundant.
    pub fn c_minimized(self) -> bool {
        self.has(C_MINIMIZED)
    }

    /// `true` iff the generator system is up to date and irredundant.
    pub fn g_minimized(self) -> bool {
        self.has(G_MINIMIZED)
    }

    /// `true` iff `sat_c` can be trusted without rebuilding.
    pub fn sat_c_up_to_date(self) -> bool {
        self.has(SAT_C_UP_TO_DATE)
    }

    /// `true` iff `sat_g` can be trusted without rebuilding.
    pub fn sat_g_up_to_date(self) -> bool {
        self.has(SAT_G_UP_TO_DATE)
    }

    /// Mark (or unmark) this as the distinguished zero-dimension universe.
    pub fn set_zero_dim_univ(&mut self, value: bool) {
        self.set(ZERO_DIM_UNIV, value);
    }

    /// Mark the constraint system fresh or stale; marking it stale also
    /// invalidates its minimality and its saturation matrix.
    pub fn set_c_up_to_date(&mut self, value: bool) {
        self.set(C_UP_TO_DATE, value);
        if !value {
            self.set(C_MINIMIZED, false);
            self.set(SAT_C_UP_TO_DATE, false);
        }
    }

    /// Mark the generator system fresh or stale; marking it stale also
    /// invalidates its minimality and its saturation matrix.
    pub fn set_g_up_to_date(&mut self, value: bool) {
        self.set(G_UP_TO_DATE, value);
        if !value {
            self.set(G_MINIMIZED, false);
            self.set(SAT_G_UP_TO_DATE, false);
        }
    }

    /// Mark the constraint system minimized; minimized implies up to date.
    pub fn set_c_minimized(&mut self, value: bool) {
        self.set(C_MINIMIZED, value);
        if value {
            self.set(C_UP_TO_DATE, true);
        }
    }

    /// Mark the generator system minimized; minimized implies up to date.
    pub fn set_g_minimized(&mut self, value: bool) {
        self.set(G_MINIMIZED, value);
        if value {
            self.set(G_UP_TO_DATE, true);
        }
    }

    /// Mark `sat_c` trustworthy (or not).
    pub fn set_sat_c_up_to_date(&mut self, value: bool) {
        self.set(SAT_C_UP_TO_DATE, value);
    }

    /// Mark `sat_g` trustworthy (or not).
    pub fn set_sat_g_up_to_date(&mut self, value: bool) {
        self.set(SAT_G_UP_TO_DATE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    send_sync_test!(status, Status);

    #[test]
    fn default_is_zero_dim_universe_and_fully_minimized() {
        let s = Status::default();
        assert!(s.is_zero_dim_univ());
        assert!(s.c_minimized());
        assert!(s.g_minimized());
        assert!(!s.is_empty());
    }

    #[test]
    fn clearing_c_up_to_date_also_clears_minimized_and_sat() {
        let mut s = Status::default();
        s.set_sat_c_up_to_date(true);
        s.set_c_up_to_date(false);
        assert!(!s.c_minimized());
        assert!(!s.sat_c_up_to_date());
    }

    #[test]
    fn marking_empty_clears_generator_flags() {
        let mut s = Status::default();
        s.set_empty(true);
        assert!(s.is_empty());
        assert!(!s.g_up_to_date());
    }
}
