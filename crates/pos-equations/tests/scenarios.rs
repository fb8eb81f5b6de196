//! Concrete end-to-end scenarios exercising `prepare_and_solve` through the
//! public API only.

mod common;

use common::{Ctx, NoOrGroups, Segments};
use pos_equations::{PosEquations, SolverConfig};

/// `x + y = 10`, both open on `[0, 10]`, no preference: feasibility settles
/// on some split that sums to 10 and stays in range; resolving it again
/// with nothing changed produces no further solution changes.
#[test]
fn sum_equation_stays_within_segments_and_is_idempotent() {
    let mut engine = PosEquations::new(SolverConfig::default());
    // x + y - ten = 0, "ten" pinned at 10 stands in for the missing constant
    // term the row format has no slot for.
    engine.add_equation(&[("x", 1.0), ("y", 1.0), ("ten", -1.0)]);
    let x = engine.variable_id("x").unwrap();
    let y = engine.variable_id("y").unwrap();
    let ten = engine.variable_id("ten").unwrap();

    let mut segments = Segments::new()
        .with_range(x, 0.0, 10.0)
        .with_range(y, 0.0, 10.0)
        .with_range(ten, 10.0, 10.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("two open variables never hit a step cap");

    let solution = engine.get_solution();
    assert!((solution["x"] + solution["y"] - 10.0).abs() < 1e-9);
    assert!(solution["x"] >= 0.0 && solution["x"] <= 10.0);
    assert!(solution["y"] >= 0.0 && solution["y"] <= 10.0);

    engine.clear_solution_changes();
    let second = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("second pass with nothing changed must not fail");
    assert!(second.solution_changes.is_empty());
}

/// `x - y = 0`, `y + z = 5`, `y` confined to `[2, 3]` with a preferred value
/// of `2.5`: since `y` never becomes any row's bound variable it keeps its
/// preferred value, and `x`/`z` are pulled to match by their own rows.
#[test]
fn coupled_rows_respect_segment_and_preference() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("x", 1.0), ("y", -1.0)]);
    engine.add_equation(&[("y", 1.0), ("z", 1.0), ("five", -1.0)]);

    let x = engine.variable_id("x").unwrap();
    let y = engine.variable_id("y").unwrap();
    let z = engine.variable_id("z").unwrap();
    let five = engine.variable_id("five").unwrap();

    let mut segments = Segments::new()
        .with_range(x, 0.0, f64::INFINITY)
        .with_range(y, 2.0, 3.0)
        .with_preferred(y, 2.5)
        .with_range(z, 0.0, f64::INFINITY)
        .with_range(five, 5.0, 5.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("a fully open coupled system never hits a step cap");

    let solution = engine.get_solution();
    assert!((solution["y"] - 2.5).abs() < 1e-9);
    assert!(solution["y"] >= 2.0 && solution["y"] <= 3.0);
    assert!((solution["x"] - solution["y"]).abs() < 1e-9);
    assert!((solution["z"] - (5.0 - solution["y"])).abs() < 1e-9);
}

/// A row pinning `x` to `5` while its segment caps it at `3`, with `x`
/// carrying a priority-10 resistance: feasibility drives `x` to `5`
/// regardless of the segment (a bound variable's row takes precedence over
/// its own boundary), and optimization can't walk it back down since `x`'s
/// own resistance already meets the violation's priority — it self-suspends
/// before ever consulting its hard-pinned row partner.
#[test]
fn segment_violation_at_priority_stays_suspended() {
    let mut engine = PosEquations::new(SolverConfig::default());
    // x - 5 * one = 0, "one" pinned at 1 scaled by 5 stands in for "x = 5".
    engine.add_equation(&[("x", 1.0), ("one", -5.0)]);

    let x = engine.variable_id("x").unwrap();
    let one = engine.variable_id("one").unwrap();

    let mut segments = Segments::new()
        .with_range(x, 0.0, 3.0)
        .with_resistance(x, 10.0)
        .with_range(one, 1.0, 1.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    let report = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("a single pinned-constant row never hits a step cap");

    let solution = engine.get_solution();
    assert!((solution["x"] - 5.0).abs() < 1e-9);
    assert_eq!(report.remaining_violations, vec![x]);
}

/// `x + y = 0`, `x - y = 2` (via a pinned constant): a fully determined,
/// open system has exactly one solution, `x = 1, y = -1`.
#[test]
fn two_independent_rows_reach_the_unique_solution() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("x", 1.0), ("y", 1.0)]);
    engine.add_equation(&[("x", 1.0), ("y", -1.0), ("two", -1.0)]);

    let x = engine.variable_id("x").unwrap();
    let y = engine.variable_id("y").unwrap();
    let two = engine.variable_id("two").unwrap();

    let mut segments = Segments::new()
        .with_range(x, f64::NEG_INFINITY, f64::INFINITY)
        .with_range(y, f64::NEG_INFINITY, f64::INFINITY)
        .with_range(two, 2.0, 2.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("a fully determined open system never hits a step cap");

    let solution = engine.get_solution();
    assert!((solution["x"] - 1.0).abs() < 1e-9);
    assert!((solution["y"] - (-1.0)).abs() < 1e-9);
}

/// Adding a row and removing it again before the next solve leaves the net
/// base set unchanged, so the following pass reports no solution changes.
#[test]
fn add_then_remove_row_in_same_batch_yields_no_changes() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("a", 1.0), ("b", -1.0)]);
    let a = engine.variable_id("a").unwrap();
    let b = engine.variable_id("b").unwrap();

    let mut segments = Segments::new()
        .with_range(a, f64::NEG_INFINITY, f64::INFINITY)
        .with_range(b, f64::NEG_INFINITY, f64::INFINITY)
        .with_preferred(a, 3.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("baseline pass never hits a step cap");
    engine.clear_solution_changes();

    let throwaway = engine.add_equation(&[("a", 1.0), ("b", 1.0)]);
    engine.remove_equation(throwaway);

    let report = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("an add immediately undone by a remove never hits a step cap");
    assert!(report.solution_changes.is_empty());
}

/// A prior solution of `{a=4, b=1}` with `a` tied to `b` (`a - b = 0`); a
/// new segment then confines `a` to `[0, 2]` while its stability preference
/// still favors `4`: the nearest boundary wins and `b` follows along since
/// it is coupled by the equation.
#[test]
fn tightened_segment_pulls_coupled_variable_to_nearest_boundary() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("a", 1.0), ("b", -1.0)]);
    let a = engine.variable_id("a").unwrap();
    let b = engine.variable_id("b").unwrap();

    let mut segments = Segments::new()
        .with_range(a, 0.0, 10.0)
        .with_resistance(a, 5.0)
        .with_preferred(a, 4.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("first pass never hits a step cap");
    let first = engine.get_solution();
    assert!((first["a"] - 4.0).abs() < 1e-9);
    assert!((first["b"] - 4.0).abs() < 1e-9);
    engine.clear_solution_changes();

    segments.min.insert(a, 0.0);
    segments.max.insert(a, 2.0);
    segments.changes.insert(a);

    let report = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("tightening a's segment never hits a step cap");

    let solution = engine.get_solution();
    assert!((solution["a"] - 2.0).abs() < 1e-9);
    assert!((solution["b"] - 2.0).abs() < 1e-9);
    assert!(report.solution_changes.contains(&a));
    assert!(report.solution_changes.contains(&b));
}
