// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Redundancy removal: once a system has been fully converted against its
//! dual, drop the rows whose saturation set is covered by another row's,
//! and fold surplus lines/equalities down to a basis in echelon form.

use crate::bitset::BitsetMatrix;
use crate::row::{Row, RowKind};

/// Indices (ascending) of the redundant rows of a system whose saturation
/// against the dual is `sat` (one bitset per row, a set bit meaning "this
/// row saturates that dual row") and whose kinds are `kinds`.
///
/// A row is redundant iff some other row of the same coarse kind class
/// saturates a strict superset of what it saturates: everything the weaker
/// row touches, the stronger row already touches, so the weaker one spans
/// no face of its own. Ties keep the lowest index. Lines and equalities
/// are excluded on both sides — they saturate everything and are reduced
/// against each other by [`reduce_lines_or_equalities`] instead.
pub fn redundant_rows(sat: &BitsetMatrix, kinds: &[RowKind]) -> Vec<usize> {
    debug_assert_eq!(sat.nrows(), kinds.len());
    let n = sat.nrows();
    let participant: Vec<bool> = kinds.iter().map(|k| !k.is_line_or_equality()).collect();
    let counts: Vec<usize> = (0..n).map(|i| sat.row(i).count()).collect();
    let mut redundant = vec![false; n];
    for i in 0..n {
        if !participant[i] || redundant[i] {
            continue;
        }
        for j in 0..n {
            if i == j || !participant[j] || redundant[j] || counts[i] > counts[j] {
                continue;
            }
            if !sat.row(i).is_subset_of(sat.row(j)) {
                continue;
            }
            let strictly_weaker = counts[i] < counts[j] || sat.row(i) != sat.row(j);
            let tied_but_later = !strictly_weaker && j < i;
            if strictly_weaker || tied_but_later {
                redundant[i] = true;
                break;
            }
        }
    }
    (0..n).filter(|&i| redundant[i]).collect()
}

/// Reduce the line-or-equality rows of `rows` (a prefix, per the sort
/// order) to echelon form, rightmost column first: for each pivot column
/// (scanned from the last homogeneous column down to column 1), find a
/// line/equality row with a non-zero entry there, use it to eliminate that
/// column from every other line/equality row, then move to the next
/// column. Rows that become entirely zero (linearly dependent on earlier
/// pivots) are reported for removal.
///
/// Any consistent pivot order produces a valid basis; choosing the end of
/// the row means homogeneous coordinates appended later by dimension
/// growth never perturb the pivots already chosen for the original
/// dimensions.
pub fn reduce_lines_or_equalities(rows: &mut [Row]) -> Vec<usize> {
    let num_lines = rows.iter().filter(|r| r.kind().is_line_or_equality()).count();
    if num_lines == 0 {
        return Vec::new();
    }
    let ncols = rows[0].len();
    let eps = rows[0].epsilon_index();
    let last_col = eps.unwrap_or(ncols).saturating_sub(1);
    let mut used: Vec<bool> = vec![false; num_lines];
    for col in (1..=last_col).rev() {
        let pivot = (0..num_lines).find(|&i| !used[i] && !rows[i].coeff(col).is_zero());
        let Some(pivot) = pivot else { continue };
        used[pivot] = true;
        for i in 0..num_lines {
            if i == pivot || rows[i].coeff(col).is_zero() {
                continue;
            }
            let reduced = rows[i].combine(&rows[pivot], col);
            rows[i] = reduced;
        }
    }
    (0..num_lines)
        .filter(|&i| rows[i].coefficients().iter().all(|c| c.is_zero()))
        .collect()
}
