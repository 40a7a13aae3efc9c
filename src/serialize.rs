// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! ASCII (de)serialisation: a stable, whitespace-tokenised dump of rows,
//! systems and whole polyhedra.
//!
//! A row dumps as
//!
//! ```text
//! size <n> <c0> <c1> ... <c_n-1> f <flags>
//! ```
//!
//! with `<flags>` the four `+NAME`/`-NAME` tokens for the bits `RPI_V`,
//! `RPI` (kind: set for ray/point/inequality rows), `NNC_V` and `NNC`
//! (topology). A system prefixes its rows with its topology, its
//! first-pending-row index, and a `<rows> x <cols>` matrix header. A
//! polyhedron dumps its space dimension, its status bits, both systems and
//! (when their status bits say they are valid) both saturation matrices,
//! each saturation row as one string of `0`/`1` digits.
//!
//! Loaders accept either sign on the validity bits: a dump from a build
//! that cannot distinguish them still reads back.

use crate::bigint::Coefficient;
use crate::bitset::Bitset;
use crate::constraint_system::ConstraintSystem;
use crate::error::{PplError, Result};
use crate::generator_system::GeneratorSystem;
use crate::linear_system::LinearSystem;
use crate::matrix::Matrix;
use crate::polyhedron::Polyhedron;
use crate::row::{Row, RowKind, Topology};
use crate::saturation::{Orientation, SaturationMatrix};
use crate::status::Status;
use std::fmt::Write as _;

/// Which system a row belongs to; needed to rebuild the fine-grained
/// [`RowKind`] from the coarse `RPI` flag plus the coefficients.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RowContext {
    Constraint,
    Generator,
}

struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Tokens {
            iter: input.split_whitespace(),
        }
    }

    fn next(&mut self) -> Result<&'a str> {
        self.iter.next().ok_or_else(|| PplError::InvalidArgument {
            text: "unexpected end of input".to_string(),
        })
    }

    fn expect(&mut self, literal: &str) -> Result<()> {
        let tok = self.next()?;
        if tok != literal {
            return Err(PplError::InvalidArgument {
                text: format!("expected `{literal}`, found `{tok}`"),
            });
        }
        Ok(())
    }

    fn usize(&mut self) -> Result<usize> {
        let tok = self.next()?;
        tok.parse().map_err(|_| PplError::InvalidArgument {
            text: format!("expected a count, found `{tok}`"),
        })
    }

    fn coefficient(&mut self) -> Result<Coefficient> {
        let tok = self.next()?;
        tok.parse().map_err(|_| PplError::InvalidArgument {
            text: format!("expected an integer, found `{tok}`"),
        })
    }

    /// A `+NAME`/`-NAME` flag token; returns whether the bit is set.
    /// `tolerant` flags (the validity bits) accept either sign as set.
    fn flag(&mut self, name: &str, tolerant: bool) -> Result<bool> {
        let tok = self.next()?;
        let (sign, body) = tok.split_at(1);
        if body != name || (sign != "+" && sign != "-") {
            return Err(PplError::InvalidArgument {
                text: format!("expected a `{name}` flag, found `{tok}`"),
            });
        }
        Ok(tolerant || sign == "+")
    }
}

fn dump_row(out: &mut String, row: &Row) {
    let _ = write!(out, "size {}", row.len());
    for c in row.coefficients() {
        let _ = write!(out, " {c}");
    }
    let rpi = if row.kind().is_line_or_equality() { '-' } else { '+' };
    let nnc = if row.topology().is_nnc() { '+' } else { '-' };
    let _ = writeln!(out, " f +RPI_V {rpi}RPI +NNC_V {nnc}NNC");
}

fn load_row(tokens: &mut Tokens<'_>, context: RowContext) -> Result<Row> {
    tokens.expect("size")?;
    let n = tokens.usize()?;
    let mut coefficients = Vec::with_capacity(n);
    for _ in 0..n {
        coefficients.push(tokens.coefficient()?);
    }
    tokens.expect("f")?;
    tokens.flag("RPI_V", true)?;
    let rpi = tokens.flag("RPI", false)?;
    tokens.flag("NNC_V", true)?;
    let nnc = tokens.flag("NNC", false)?;
    let topology = if nnc { Topology::Nnc } else { Topology::Closed };
    if n == 0 || (nnc && n < 2) {
        return Err(PplError::InvalidArgument {
            text: "a row needs at least its leading coefficient".to_string(),
        });
    }
    let kind = match (context, rpi) {
        (RowContext::Constraint, false) => RowKind::Equality,
        (RowContext::Constraint, true) => {
            if nnc && coefficients[n - 1].is_negative() {
                RowKind::StrictInequality
            } else {
                RowKind::NonStrictInequality
            }
        }
        (RowContext::Generator, false) => RowKind::Line,
        (RowContext::Generator, true) => {
            if coefficients[0].is_zero() {
                RowKind::Ray
            } else if nnc && !coefficients[n - 1].is_positive() {
                RowKind::ClosurePoint
            } else {
                RowKind::Point
            }
        }
    };
    Ok(Row::new(kind, topology, coefficients))
}

fn dump_system(out: &mut String, system: &LinearSystem) {
    let m = system.matrix();
    let _ = writeln!(out, "topology {}", system.topology());
    let _ = writeln!(out, "first_pending {}", m.first_pending());
    let _ = writeln!(out, "{} x {}", m.nrows(), m.ncols());
    for row in m.iter() {
        dump_row(out, row);
    }
}

fn load_system(tokens: &mut Tokens<'_>, context: RowContext) -> Result<LinearSystem> {
    tokens.expect("topology")?;
    let topology = match tokens.next()? {
        "C" => Topology::Closed,
        "NNC" => Topology::Nnc,
        other => {
            return Err(PplError::InvalidArgument {
                text: format!("unknown topology `{other}`"),
            })
        }
    };
    tokens.expect("first_pending")?;
    let first_pending = tokens.usize()?;
    let nrows = tokens.usize()?;
    tokens.expect("x")?;
    let ncols = tokens.usize()?;
    let mut rows = Vec::with_capacity(nrows);
    for _ in 0..nrows {
        let row = load_row(tokens, context)?;
        if row.len() != ncols || row.topology() != topology {
            return Err(PplError::InvalidArgument {
                text: "row does not match its system header".to_string(),
            });
        }
        rows.push(row);
    }
    if first_pending > nrows {
        return Err(PplError::InvalidArgument {
            text: "first_pending beyond the row count".to_string(),
        });
    }
    let mut matrix = Matrix::new(ncols);
    for (i, row) in rows.into_iter().enumerate() {
        if i < first_pending {
            matrix.insert(row);
        } else {
            matrix.insert_pending(row);
        }
    }
    Ok(LinearSystem::from_matrix(matrix, topology))
}

fn dump_sat(out: &mut String, sat: &SaturationMatrix) {
    let _ = writeln!(out, "{} x {}", sat.nrows(), sat.ncols());
    for i in 0..sat.nrows() {
        if sat.ncols() == 0 {
            continue;
        }
        let mut line = String::with_capacity(sat.ncols());
        for j in 0..sat.ncols() {
            line.push(if sat.test(i, j) { '1' } else { '0' });
        }
        let _ = writeln!(out, "{line}");
    }
}

fn load_sat(tokens: &mut Tokens<'_>, orientation: Orientation) -> Result<SaturationMatrix> {
    let nrows = tokens.usize()?;
    tokens.expect("x")?;
    let ncols = tokens.usize()?;
    let mut sat = SaturationMatrix::new(orientation, ncols);
    for _ in 0..nrows {
        let mut bits = Bitset::new(ncols);
        if ncols > 0 {
            let tok = tokens.next()?;
            if tok.len() != ncols || !tok.chars().all(|c| c == '0' || c == '1') {
                return Err(PplError::InvalidArgument {
                    text: format!("malformed saturation row `{tok}`"),
                });
            }
            for (j, c) in tok.chars().enumerate() {
                if c == '1' {
                    bits.set(j);
                }
            }
        }
        sat.push_row_with(bits);
    }
    Ok(sat)
}

fn dump_status(out: &mut String, status: Status) {
    let bit = |b: bool| if b { '+' } else { '-' };
    let _ = writeln!(
        out,
        "status {}ZE {}EM {}CS {}GS {}CM {}GM {}SC {}SG",
        bit(status.is_zero_dim_univ()),
        bit(status.is_empty()),
        bit(status.c_up_to_date()),
        bit(status.g_up_to_date()),
        bit(status.c_minimized()),
        bit(status.g_minimized()),
        bit(status.sat_c_up_to_date()),
        bit(status.sat_g_up_to_date()),
    );
}

fn load_status(tokens: &mut Tokens<'_>) -> Result<Status> {
    tokens.expect("status")?;
    let ze = tokens.flag("ZE", false)?;
    let em = tokens.flag("EM", false)?;
    let cs = tokens.flag("CS", false)?;
    let gs = tokens.flag("GS", false)?;
    let cm = tokens.flag("CM", false)?;
    let gm = tokens.flag("GM", false)?;
    let sc = tokens.flag("SC", false)?;
    let sg = tokens.flag("SG", false)?;
    let mut status = Status::default();
    status.set_empty(em);
    status.set_zero_dim_univ(ze);
    status.set_c_up_to_date(cs);
    status.set_g_up_to_date(gs);
    status.set_c_minimized(cm);
    status.set_g_minimized(gm);
    status.set_sat_c_up_to_date(sc);
    status.set_sat_g_up_to_date(sg);
    Ok(status)
}

impl ConstraintSystem {
    /// Serialise to the token format of this module.
    pub fn ascii_dump(&self) -> String {
        let mut out = String::new();
        dump_system(&mut out, self.linear_system());
        out
    }

    /// Parse a dump produced by [`ConstraintSystem::ascii_dump`].
    pub fn ascii_load(input: &str) -> Result<ConstraintSystem> {
        let mut tokens = Tokens::new(input);
        let system = load_system(&mut tokens, RowContext::Constraint)?;
        Ok(ConstraintSystem::from_linear_system(system))
    }
}

impl GeneratorSystem {
    /// Serialise to the token format of this module.
    pub fn ascii_dump(&self) -> String {
        let mut out = String::new();
        dump_system(&mut out, self.linear_system());
        out
    }

    /// Parse a dump produced by [`GeneratorSystem::ascii_dump`].
    pub fn ascii_load(input: &str) -> Result<GeneratorSystem> {
        let mut tokens = Tokens::new(input);
        let system = load_system(&mut tokens, RowContext::Generator)?;
        Ok(GeneratorSystem::from_linear_system(system))
    }
}

impl Polyhedron {
    /// Serialise the whole polyhedron: status, space dimension, both
    /// systems, and whichever saturation matrices are valid.
    pub fn ascii_dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "space_dim {}", self.space_dim);
        let _ = writeln!(out, "topology {}", self.topology);
        dump_status(&mut out, self.status);
        let _ = writeln!(out, "con_sys");
        dump_system(&mut out, self.constraints.linear_system());
        let _ = writeln!(out, "gen_sys");
        dump_system(&mut out, self.generators.linear_system());
        if self.status.sat_c_up_to_date() {
            let _ = writeln!(out, "sat_c");
            dump_sat(&mut out, &self.sat_c);
        }
        if self.status.sat_g_up_to_date() {
            let _ = writeln!(out, "sat_g");
            dump_sat(&mut out, &self.sat_g);
        }
        out
    }

    /// Parse a dump produced by [`Polyhedron::ascii_dump`].
    pub fn ascii_load(input: &str) -> Result<Polyhedron> {
        let mut tokens = Tokens::new(input);
        tokens.expect("space_dim")?;
        let space_dim = tokens.usize()?;
        tokens.expect("topology")?;
        let topology = match tokens.next()? {
            "C" => Topology::Closed,
            "NNC" => Topology::Nnc,
            other => {
                return Err(PplError::InvalidArgument {
                    text: format!("unknown topology `{other}`"),
                })
            }
        };
        let status = load_status(&mut tokens)?;
        tokens.expect("con_sys")?;
        let constraints = load_system(&mut tokens, RowContext::Constraint)?;
        tokens.expect("gen_sys")?;
        let generators = load_system(&mut tokens, RowContext::Generator)?;
        if constraints.topology() != topology
            || generators.topology() != topology
            || constraints.space_dimension() != space_dim
            || generators.space_dimension() != space_dim
        {
            return Err(PplError::InvalidArgument {
                text: "system headers disagree with the polyhedron header".to_string(),
            });
        }
        let mut sat_c = SaturationMatrix::new(Orientation::RowsAreGenerators, 0);
        let mut sat_g = SaturationMatrix::new(Orientation::RowsAreConstraints, 0);
        if status.sat_c_up_to_date() {
            tokens.expect("sat_c")?;
            sat_c = load_sat(&mut tokens, Orientation::RowsAreGenerators)?;
        }
        if status.sat_g_up_to_date() {
            tokens.expect("sat_g")?;
            sat_g = load_sat(&mut tokens, Orientation::RowsAreConstraints)?;
        }
        Ok(Polyhedron {
            space_dim,
            topology,
            status,
            constraints: ConstraintSystem::from_linear_system(constraints),
            generators: GeneratorSystem::from_linear_system(generators),
            sat_c,
            sat_g,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, LinearExpression, Variable};

    fn x() -> LinearExpression {
        LinearExpression::from_variable(Variable::new(0))
    }

    #[test]
    fn a_minimized_polyhedron_round_trips() {
        let mut p = Polyhedron::universe(2, Topology::Closed);
        p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
        p.minimize();
        let dump = p.ascii_dump();
        let mut reloaded = Polyhedron::ascii_load(&dump).unwrap();
        assert!(p.equals(&mut reloaded));
        assert_eq!(dump, reloaded.ascii_dump());
    }

    #[test]
    fn an_nnc_polyhedron_round_trips_with_its_strictness() {
        let mut p = Polyhedron::universe(1, Topology::Nnc);
        p.add_constraint(Constraint::strict_inequality(x())).unwrap();
        p.minimize();
        let dump = p.ascii_dump();
        let mut reloaded = Polyhedron::ascii_load(&dump).unwrap();
        assert!(reloaded.constraints().has_strict_inequalities());
        assert!(p.equals(&mut reloaded));
    }

    #[test]
    fn validity_flags_are_accepted_either_way() {
        let mut cs = ConstraintSystem::new(1, Topology::Closed);
        cs.insert(Constraint::non_strict_inequality(x()));
        let dump = cs.ascii_dump().replace("+RPI_V", "-RPI_V");
        let reloaded = ConstraintSystem::ascii_load(&dump).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut cs = ConstraintSystem::new(1, Topology::Closed);
        cs.insert(Constraint::non_strict_inequality(x()));
        let dump = cs.ascii_dump();
        let truncated = &dump[..dump.len() / 2];
        assert!(ConstraintSystem::ascii_load(truncated).is_err());
    }
}
