//! Laws and boundary behavior that must hold across arbitrary equation
//! sets, exercised through the public API only.

mod common;

use common::{Ctx, NoOrGroups, Segments};
use pos_equations::{PosEquations, SolverConfig};

#[test]
fn idempotent_second_pass_has_no_changes() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("a", 1.0), ("b", -1.0)]);
    let a = engine.variable_id("a").unwrap();
    let mut segments = Segments::new().with_preferred(a, 3.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("first pass never hits a step cap");
    engine.clear_solution_changes();

    let second = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("second pass with no edits never hits a step cap");
    assert!(second.solution_changes.is_empty());
}

#[test]
fn warm_start_is_pointwise_unchanged_across_a_no_op_pass() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("a", 1.0), ("b", -1.0)]);
    let mut segments = Segments::new().with_preferred(engine.variable_id("a").unwrap(), 3.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .unwrap();
    let first = engine.get_solution();
    engine.clear_solution_changes();

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .unwrap();
    let second = engine.get_solution();

    for (var, value) in &first {
        assert!((second[var] - value).abs() < 1e-9, "{var} drifted across a no-op pass");
    }
}

/// Scaling a base row by a nonzero constant must not change the final
/// solution: the delta computations throughout the engine are ratios of
/// coefficients within a row, never raw magnitudes.
#[test]
fn scaling_a_row_does_not_change_the_solution() {
    let solve = |coeff: f64| {
        let mut engine = PosEquations::new(SolverConfig::default());
        engine.add_equation(&[("a", coeff), ("b", -coeff)]);
        let a = engine.variable_id("a").unwrap();
        let mut segments = Segments::new()
            .with_range(a, 0.0, 10.0)
            .with_resistance(a, 5.0)
            .with_preferred(a, 4.0);
        let mut or_groups = NoOrGroups;
        let mut ctx = Ctx;
        engine
            .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
            .expect("a scaled two-variable row never hits a step cap");
        engine.get_solution()
    };

    let unscaled = solve(1.0);
    let scaled = solve(2.5);
    assert!((unscaled["a"] - scaled["a"]).abs() < 1e-9);
    assert!((unscaled["b"] - scaled["b"]).abs() < 1e-9);
}

/// Reordering the rows of a fully determined system must not change its
/// (unique) solution.
#[test]
fn row_order_does_not_change_a_unique_solution() {
    let solve = |rows_reversed: bool| {
        let mut engine = PosEquations::new(SolverConfig::default());
        let first = [("x", 1.0), ("y", 1.0)];
        let second = [("x", 1.0), ("y", -1.0), ("two", -1.0)];
        if rows_reversed {
            engine.add_equation(&second);
            engine.add_equation(&first);
        } else {
            engine.add_equation(&first);
            engine.add_equation(&second);
        }
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
        engine.get_solution()
    };

    let forward = solve(false);
    let reversed = solve(true);
    assert!((forward["x"] - reversed["x"]).abs() < 1e-9);
    assert!((forward["y"] - reversed["y"]).abs() < 1e-9);
    assert!((forward["x"] - 1.0).abs() < 1e-9);
    assert!((forward["y"] - (-1.0)).abs() < 1e-9);
}

/// An empty equation set resolves immediately with no solution changes.
#[test]
fn empty_equation_set_solves_immediately() {
    let mut engine = PosEquations::new(SolverConfig::default());
    let mut segments = Segments::new();
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    let report = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("an empty equation set never fails");
    assert!(report.solution_changes.is_empty());
}

/// A row whose coefficients cancel to nothing is tolerated and does not
/// block the rest of the system from being solved.
#[test]
fn all_zero_row_does_not_block_other_rows() {
    let mut engine = PosEquations::new(SolverConfig::default());
    // x + (-x) cancels exactly, leaving an empty row.
    engine.add_equation(&[("x", 1.0), ("x", -1.0)]);
    engine.add_equation(&[("a", 1.0), ("b", -1.0)]);

    let a = engine.variable_id("a").unwrap();
    let mut segments = Segments::new().with_preferred(a, 7.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("an all-zero row must not stall the rest of the system");

    let solution = engine.get_solution();
    assert!((solution["a"] - solution["b"]).abs() < 1e-9);
}

/// A segment pinned to a single point (`min == max`) forces the variable to
/// that value, and never moves even when coupled to another variable by an
/// equation that would otherwise pull it elsewhere.
#[test]
fn pinned_segment_forces_exact_value() {
    let mut engine = PosEquations::new(SolverConfig::default());
    engine.add_equation(&[("p", 1.0), ("q", -1.0)]);
    let p = engine.variable_id("p").unwrap();

    let mut segments = Segments::new().with_range(p, 7.0, 7.0);
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("a pinned variable coupled to an open one never hits a step cap");

    let solution = engine.get_solution();
    assert!((solution["p"] - 7.0).abs() < 1e-9);
    assert!((solution["q"] - 7.0).abs() < 1e-9);
}
