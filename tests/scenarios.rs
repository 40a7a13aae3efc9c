// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! End-to-end scenarios exercising whole conversion/minimisation cycles
//! through the public API.

use ppl_polyhedra::{
    Coefficient, Constraint, Generator, GeneratorSystem, LinearExpression, PolyConRelation,
    Polyhedron, Topology, Variable,
};

/// Route the engine's tracing output to the test harness when
/// `RUST_LOG` asks for it.
fn trace_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn x() -> LinearExpression {
    LinearExpression::from_variable(Variable::new(0))
}

fn y() -> LinearExpression {
    LinearExpression::from_variable(Variable::new(1))
}

#[test]
fn triangle_constraints_yield_its_three_corners() {
    trace_init();
    let mut p = Polyhedron::universe(2, Topology::Closed);
    p.add_constraint(Constraint::non_strict_inequality(x())).unwrap();
    p.add_constraint(Constraint::non_strict_inequality(y())).unwrap();
    p.add_constraint(Constraint::non_strict_inequality(
        LinearExpression::constant(1) - x() - y(),
    ))
    .unwrap();

    assert!(p.minimize());
    assert!(p.is_bounded());
    let gens = p.generators();
    assert_eq!(gens.len(), 3);
    let corners = [
        Generator::point_unit(LinearExpression::zero()),
        Generator::point_unit(x()),
        Generator::point_unit(y()),
    ];
    for corner in corners {
        assert!(gens.iter().any(|g| g == corner));
    }
}

#[test]
fn half_line_roundtrip_relation_and_image() {
    let mut gs = GeneratorSystem::new(1, Topology::Closed);
    gs.insert(Generator::point_unit(LinearExpression::zero()));
    gs.insert(Generator::ray(x()));
    let mut p = Polyhedron::from_generators(gs);

    {
        let cs = p.constraints();
        assert_eq!(cs.len(), 1);
        assert!(cs.iter().any(|c| c == Constraint::non_strict_inequality(x())));
    }

    let far = Constraint::non_strict_inequality(LinearExpression::constant(-5) + x());
    let rel = p.relation_with(&far);
    assert!(rel.implies(PolyConRelation::STRICTLY_INTERSECTS));
    assert!(!rel.implies(PolyConRelation::IS_INCLUDED));

    p.affine_image(Variable::new(0), &(x() * 2 + LinearExpression::constant(3)), &Coefficient::one())
        .unwrap();
    let cs = p.constraints();
    assert_eq!(cs.len(), 1);
    assert!(cs
        .iter()
        .any(|c| c == Constraint::non_strict_inequality(LinearExpression::constant(-3) + x())));
}

#[test]
fn nnc_strict_half_line_closes_to_the_closed_one() {
    let mut p = Polyhedron::universe(1, Topology::Nnc);
    p.add_constraint(Constraint::strict_inequality(x())).unwrap();

    {
        let gens = p.generators();
        assert_eq!(gens.len(), 3);
        assert!(gens.iter().any(|g| g == Generator::closure_point(LinearExpression::zero(), 1)));
        assert!(gens.iter().any(|g| g == Generator::point_unit(x())));
        assert!(gens.iter().any(|g| g == Generator::ray(x())));
    }

    let mut closed = p.clone();
    closed.topological_closure_assign();
    let as_closed = closed.with_topology(Topology::Closed).unwrap();
    let mut want = Polyhedron::from_box(&[(Some(Coefficient::zero()), None)], Topology::Closed).unwrap();
    let mut as_closed = as_closed;
    assert!(as_closed.equals(&mut want));
}

#[test]
fn nnc_open_segment_generators_and_containment() {
    let mut p = Polyhedron::universe(1, Topology::Nnc);
    p.add_constraint(Constraint::strict_inequality(x())).unwrap();
    p.add_constraint(Constraint::strict_inequality(LinearExpression::constant(1) - x()))
        .unwrap();

    {
        let gens = p.generators();
        assert_eq!(gens.len(), 3);
        assert!(gens.iter().any(|g| g == Generator::closure_point(LinearExpression::zero(), 1)));
        assert!(gens.iter().any(|g| g == Generator::closure_point(x(), 1)));
        assert!(gens.iter().any(|g| g == Generator::point(x(), 2)));
    }

    // the open segment does not contain the closed half-line x >= 0
    let mut half_line = Polyhedron::from_box(&[(Some(Coefficient::zero()), None)], Topology::Closed).unwrap();
    assert!(!p.contains(&mut half_line));
    // but the closed unit interval contains the open segment
    let mut unit =
        Polyhedron::from_box(&[(Some(Coefficient::zero()), Some(Coefficient::one()))], Topology::Closed)
            .unwrap();
    assert!(unit.contains(&mut p));
    assert!(!p.contains(&mut unit));
}

#[test]
fn contradictory_bounds_empty_the_polyhedron() {
    let mut p = Polyhedron::universe(1, Topology::Closed);
    p.add_constraint(Constraint::non_strict_inequality(LinearExpression::constant(-1) + x()))
        .unwrap(); // x >= 1
    p.add_constraint(Constraint::non_strict_inequality(-x())).unwrap(); // x <= 0

    assert!(!p.minimize());
    assert!(p.is_empty());
    assert!(p.generators().is_empty());

    // rays and lines cannot resurrect an empty polyhedron
    p.add_generator(Generator::ray(x())).unwrap();
    assert!(p.is_empty());
    p.add_generator(Generator::line(x())).unwrap();
    assert!(p.is_empty());
}

#[test]
fn speculative_hull_of_two_points_reverts() {
    let mut gs_p = GeneratorSystem::new(2, Topology::Closed);
    gs_p.insert(Generator::point_unit(LinearExpression::zero()));
    let mut p = Polyhedron::from_generators(gs_p);

    let mut gs_q = GeneratorSystem::new(2, Topology::Closed);
    gs_q.insert(Generator::point_unit(x() * 2));
    let q = Polyhedron::from_generators(gs_q);

    let mut before = p.clone();
    assert!(!p.poly_hull_assign_if_exact(&q).unwrap());
    assert!(p.equals(&mut before));

    // the plain hull is the segment and strictly contains both operands
    let mut hull = p.clone();
    hull.poly_hull_assign(&q).unwrap();
    assert!(hull.contains(&mut p));
    assert!(!p.contains(&mut hull));
}

#[test]
fn h79_widening_chain_reaches_the_half_line_and_stays() {
    // Q0 = {(0,0)}; each step hulls with the previous iterate shifted one
    // unit along x, then widens against the previous iterate.
    let shift_x = |p: &Polyhedron| {
        let mut shifted = p.clone();
        shifted
            .affine_image(Variable::new(0), &(x() + LinearExpression::constant(1)), &Coefficient::one())
            .unwrap();
        shifted
    };
    let mut gs = GeneratorSystem::new(2, Topology::Closed);
    gs.insert(Generator::point_unit(LinearExpression::zero()));
    let mut prev = Polyhedron::from_generators(gs);

    let mut widened = prev.clone();
    let mut half_line = Polyhedron::universe(2, Topology::Closed);
    half_line.add_constraint(Constraint::equality(y())).unwrap();
    half_line.add_constraint(Constraint::non_strict_inequality(x())).unwrap();

    let mut stabilised_at = None;
    for step in 1..=3 {
        let mut cur = widened.clone();
        cur.poly_hull_assign(&shift_x(&widened)).unwrap();
        cur.h79_widening_assign(&prev).unwrap();
        prev = widened;
        widened = cur;
        if widened.equals(&mut half_line) {
            stabilised_at = Some(step);
            break;
        }
    }
    assert!(stabilised_at.is_some(), "widening failed to stabilise in 3 steps");

    // once reached, a further round is a fixpoint
    let mut again = widened.clone();
    again.poly_hull_assign(&shift_x(&widened)).unwrap();
    again.h79_widening_assign(&widened).unwrap();
    assert!(again.equals(&mut half_line));
}
