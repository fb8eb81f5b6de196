//! Feasibility phase: `findFeasibleSolution` / `reduceError` (spec.md §4.5).

use super::prepare::{build_variables_by_resistance, init_derivative, replay_elimination};
use super::resistance_reduction::{reduce_resistance, ResistanceOutcome};
use super::PosEquations;
use crate::collaborators::{OrGroups, SegmentConstraints};
use crate::error::{SolveError, SolveResult};
use crate::ids::{RowId, VarId};
use crate::trace::{Direction, SolverObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReduceErrorOutcome {
    Moved,
    /// The candidate list is empty, or the priority in effect during
    /// optimization forbids the move — "false" in spec.md §4.5.
    NoCandidate,
    /// An unbounded move reached an infinite target — "0" in spec.md §4.5.
    TargetReached,
    /// Resistance reduction detected an anti-cycling loop — "-1".
    LoopDetected,
}

/// `findFeasibleSolution()`: loops `reduceError` while any row has nonzero
/// error, bounded by `maxReductionStepNum`.
pub(super) fn find_feasible_solution<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
) -> SolveResult<()> {
    let mut steps = 0u32;
    loop {
        let Some(row) = engine.inner_products.nonzero_rows().next() else { break };
        steps += 1;
        if steps > engine.config.max_reduction_step_num {
            return Err(SolveError::ReductionStepLimitExceeded {
                limit: engine.config.max_reduction_step_num,
                row,
            });
        }
        match reduce_error(engine, segments, or_groups)? {
            ReduceErrorOutcome::NoCandidate => break,
            _ => continue,
        }
    }
    Ok(())
}

/// `reduceError()` (spec.md §4.5 steps 1–8).
pub(super) fn reduce_error<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
) -> SolveResult<ReduceErrorOutcome> {
    let resistance_outcome = reduce_resistance(engine, segments, or_groups);

    let Some(candidate) = engine.candidates.last().copied() else {
        return Ok(ReduceErrorOutcome::NoCandidate);
    };
    let var = candidate.variable;
    let dir = candidate.direction;

    if let Some(ctx) = engine.optimization {
        if ctx.priority <= candidate.total_resistance {
            return Ok(ReduceErrorOutcome::NoCandidate);
        }
    }

    let current = engine.solution_value(var);
    let self_move_to = segments.next_value(var, current, dir == Direction::Up);
    let self_move = self_move_to - current;

    let rows: Vec<RowId> = engine.combination.combination_component_index(var).collect();
    let mut best_move: Option<f64> = None;
    let mut best_row: Option<RowId> = None;
    let mut best_bound_target: Option<(VarId, f64)> = None;

    for row in &rows {
        let row = *row;
        let c_v = engine.combination.get_value(row, var);
        if c_v == 0.0 {
            continue;
        }
        let error = engine.inner_products.get(row);

        let (candidate_move, bound_target) = if error.abs() > engine.config.zero_rounding {
            let mv = -error / c_v;
            if mv.signum() != dir.sign().signum() {
                continue;
            }
            (mv, None)
        } else {
            let Some(bound) = engine.bound_free.bound_var_of_row(row) else { continue };
            if bound == var {
                continue;
            }
            let c_b = engine.combination.get_value(row, bound);
            if c_b == 0.0 {
                continue;
            }
            let induced_sign = -(c_v / c_b) * dir.sign();
            let Some(induced_dir) = Direction::from_sign(induced_sign) else { continue };
            let bound_value = engine.solution_value(bound);
            let bound_target = segments.next_value(bound, bound_value, induced_dir == Direction::Up);
            let bound_delta = bound_target - bound_value;
            let mv = -bound_delta * c_b / c_v;
            (mv, Some((bound, bound_target)))
        };

        if candidate_move == 0.0 {
            continue;
        }
        if best_move.map_or(true, |m| candidate_move.abs() < m.abs()) {
            best_move = Some(candidate_move);
            best_row = Some(row);
            best_bound_target = bound_target;
        }
    }

    let (overall_move, tight_row) = match best_move {
        Some(induced) if induced.abs() < self_move.abs() => (induced, best_row),
        Some(_) | None if self_move.is_finite() => (self_move, None),
        _ => return Err(SolveError::UnboundedFeasibilityMove { var }),
    };

    if overall_move == 0.0 {
        return Ok(ReduceErrorOutcome::NoCandidate);
    }

    // Commit: update var and every zero-error row's bound variable it
    // touches, then the remaining (still-in-error) rows' inner products.
    engine.set_value(var, current + overall_move);
    let zr = engine.config.zero_rounding;

    for row in &rows {
        let row = *row;
        let c_v = engine.combination.get_value(row, var);
        if c_v == 0.0 {
            continue;
        }
        let error_before = engine.inner_products.get(row);
        if error_before.abs() > zr {
            engine.inner_products.add_to_products(row, c_v, overall_move, zr);
            continue;
        }
        let Some(bound) = engine.bound_free.bound_var_of_row(row) else { continue };
        if bound == var {
            continue;
        }
        let c_b = engine.combination.get_value(row, bound);
        if c_b == 0.0 {
            continue;
        }
        let new_value = if Some(row) == tight_row {
            best_bound_target.map(|(_, target)| target).unwrap_or_else(|| {
                engine.solution_value(bound) - c_v * overall_move / c_b
            })
        } else {
            engine.solution_value(bound) - c_v * overall_move / c_b
        };
        engine.set_value(bound, new_value);
        engine.inner_products.set_to_zero(row);
        or_groups.update_variable_satisfaction(bound, new_value, false);
        engine.resistance.calc_resistance(bound, segments, or_groups);
    }

    let new_var_value = engine.solution_value(var);
    or_groups.update_variable_satisfaction(var, new_var_value, false);
    engine.resistance.calc_resistance(var, segments, or_groups);

    init_derivative(engine);
    build_variables_by_resistance(engine);

    if matches!(resistance_outcome, ResistanceOutcome::LoopDetected) {
        return Ok(ReduceErrorOutcome::LoopDetected);
    }
    if !self_move.is_finite() && tight_row.is_none() {
        return Ok(ReduceErrorOutcome::TargetReached);
    }
    Ok(ReduceErrorOutcome::Moved)
}
