//! Priority-driven optimization phase (spec.md §4.7): drives each violated
//! variable, in decreasing priority order, toward its target until blocked
//! or the target is reached.

use super::prepare::build_variables_by_resistance;
use super::{feasibility, OptimizationContext};
use super::PosEquations;
use crate::collaborators::{OrGroups, SegmentConstraints};
use crate::error::{SolveError, SolveResult};
use crate::ids::{RowId, VarId};
use crate::trace::{Direction, SolverObserver};

/// `prepareAndSolve`'s final phase. Consumes the violation list and the
/// optimization suspension graph; mutates the solution like feasibility
/// does, but bounded by priority rather than pure error reduction.
pub(super) fn optimize<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
) -> SolveResult<()> {
    let mut steps = 0u32;

    loop {
        refresh_unblocks(engine);

        let Some(violation) = engine.violations.most_severe_active().copied() else { break };
        let var = violation.variable;
        let priority = violation.priority;
        let target = violation.target;
        let current = engine.solution_value(var);

        let Some(direction) = Direction::from_sign(target - current) else {
            engine.violations.remove(var);
            continue;
        };

        if priority <= engine.resistance.get_resistance(var, direction) {
            suspend_self(engine, var, priority);
            continue;
        }

        build_optimization_derivative(engine, var, priority, direction);

        let blocked = engine.derivative.is_empty()
            || engine.derivative.iter().all(|(&w, &d)| {
                let Some(dir_w) = Direction::from_sign(-d) else { return true };
                engine.resistance.get_resistance_with_sat_or_groups(w, dir_w) >= priority
            });
        if blocked {
            let blocked_vars: Vec<VarId> = engine.derivative.keys().copied().collect();
            suspend_by_blocked(engine, var, priority, direction, &blocked_vars);
            continue;
        }

        build_variables_by_resistance(engine);

        if let Some(row) = engine.bound_free.bound_row_of(var) {
            for freed in engine.suspension.close_blocking_equation(row) {
                engine.violations.unsuspend(freed);
            }
        }

        engine.optimization = Some(OptimizationContext { var, priority, dir: direction, target });

        loop {
            steps += 1;
            if steps > engine.config.max_optimization_steps {
                return Err(SolveError::OptimizationStepLimitExceeded {
                    limit: engine.config.max_optimization_steps,
                    var,
                });
            }
            match feasibility::reduce_error(engine, segments, or_groups)? {
                feasibility::ReduceErrorOutcome::Moved => {
                    let still_at_priority =
                        engine.violations.get(var).map(|v| v.priority) == Some(priority);
                    if !still_at_priority {
                        break;
                    }
                }
                feasibility::ReduceErrorOutcome::NoCandidate => {
                    suspend_self(engine, var, priority);
                    break;
                }
                feasibility::ReduceErrorOutcome::TargetReached
                | feasibility::ReduceErrorOutcome::LoopDetected => break,
            }
        }
        engine.optimization = None;
    }
    Ok(())
}

/// `d[v] = -direction` for a free `v`; for a bound `v` in row `r`,
/// `d[w] = sign(direction * c_{r,v}) * c_{r,w}` for every eligible free `w`
/// (spec.md §4.7 step 3).
fn build_optimization_derivative<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    var: VarId,
    priority: f64,
    direction: Direction,
) {
    engine.derivative.clear();
    if engine.bound_free.is_free(var) {
        engine.derivative.insert(var, -direction.sign());
        return;
    }
    let Some(row) = engine.bound_free.bound_row_of(var) else { return };
    let c_v = engine.combination.get_value(row, var);
    if c_v == 0.0 {
        return;
    }
    let s = (direction.sign() * c_v).signum();
    let Some(row_data) = engine.combination.row(row) else { return };
    for (w, c_w) in row_data.iter() {
        if w == var || is_excluded(engine, w, priority, row) {
            continue;
        }
        engine.derivative.insert(w, s * c_w);
    }
}

/// A free variable is excluded from the optimization derivative if it is
/// already blocked at `>= priority` by a higher-precedence row, or
/// self-blocked at `>= priority` in both directions (spec.md §4.7 step 3).
fn is_excluded<O: SolverObserver>(
    engine: &PosEquations<O>,
    w: VarId,
    priority: f64,
    row: RowId,
) -> bool {
    if let Some(sb) = engine.suspension.self_blocked(w) {
        if sb.resistance >= priority {
            return true;
        }
    }
    if let Some(blocked) = engine.suspension.blocked(w) {
        if blocked.priority < priority {
            return false;
        }
        return match engine.suspension.equation(row) {
            Some(eq) => match engine.suspension.equation(blocked.blocking) {
                Some(blocking_eq) => blocking_eq.suspension_id < eq.suspension_id,
                None => true,
            },
            None => true,
        };
    }
    false
}

fn suspend_self<O: SolverObserver>(engine: &mut PosEquations<O>, var: VarId, priority: f64) {
    engine.violations.suspend(var);
    engine.resistance.mark_violation_changed(var);
    tracing::trace!(?var, priority, "suspending violated variable");
    engine.observer.on_suspend(var, priority);
}

/// `suspendOptimizationByBlocked` (spec.md §4.7).
fn suspend_by_blocked<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    var: VarId,
    priority: f64,
    dir: Direction,
    blocked_vars: &[VarId],
) {
    suspend_self(engine, var, priority);
    let Some(row) = engine.bound_free.bound_row_of(var) else { return };
    engine.suspension.open_blocking_equation(row, var, priority, dir);

    let Some(row_data) = engine.combination.row(row) else { return };
    let members: Vec<VarId> = row_data.iter().map(|(w, _)| w).collect();
    for w in members {
        if w == var || engine.bound_free.is_bound(w) {
            continue;
        }
        if blocked_vars.contains(&w) && violated_bound_resists_free(engine, w, var, row, dir) {
            let c_w = engine.combination.get_value(row, w);
            let c_v = engine.combination.get_value(row, var);
            let relative_sign = if c_v != 0.0 { (c_w / c_v).signum() } else { 1.0 };
            engine.suspension.mark_blocked(w, row, priority, relative_sign, dir);
        } else if engine.suspension.is_blocked(w) {
            engine.suspension.mark_blocking(w, row);
        } else {
            let resists_up = engine.resistance.get_resistance_with_sat_or_groups(w, Direction::Up) >= priority;
            let resists_down =
                engine.resistance.get_resistance_with_sat_or_groups(w, Direction::Down) >= priority;
            if resists_up && resists_down {
                let resistance = engine
                    .resistance
                    .get_resistance_with_sat_or_groups(w, Direction::Up)
                    .min(engine.resistance.get_resistance_with_sat_or_groups(w, Direction::Down));
                engine.suspension.mark_self_blocked(w, row, resistance);
            }
        }
    }
}

/// `violatedBoundResistsFree(freeVar, boundVar, rowId)`: true iff moving
/// `free` in `dir` (the row's blocking direction) forces `bound` further
/// into its current violation.
fn violated_bound_resists_free<O: SolverObserver>(
    engine: &PosEquations<O>,
    free: VarId,
    bound: VarId,
    row: RowId,
    dir: Direction,
) -> bool {
    let c_free = engine.combination.get_value(row, free);
    let c_bound = engine.combination.get_value(row, bound);
    if c_free == 0.0 || c_bound == 0.0 {
        return false;
    }
    let Some(violation) = engine.violations.get(bound) else { return false };
    let Some(toward_fix) =
        Direction::from_sign(violation.target - engine.solution_value(bound))
    else {
        return false;
    };
    let induced_sign = -(c_free / c_bound) * dir.sign();
    let Some(induced_dir) = Direction::from_sign(induced_sign) else { return false };
    induced_dir == toward_fix.opposite()
}

/// Best-effort pass over the blocking/self-blocking tables: a variable whose
/// resistance has dropped below its recorded block priority is unblocked,
/// and rows it uniquely blocked are reopened for optimization (spec.md
/// §4.7 "Blocking-graph updates"). Run once per outer violation-loop
/// iteration rather than wired to every individual resistance-change event —
/// see DESIGN.md for this simplification.
fn refresh_unblocks<O: SolverObserver>(engine: &mut PosEquations<O>) {
    let blocked: Vec<VarId> = engine.suspension.blocked_variables().collect();
    for w in blocked {
        let Some(entry) = engine.suspension.blocked(w) else { continue };
        let still_resists =
            engine.resistance.get_resistance_with_sat_or_groups(w, entry.resistance_dir) >= entry.priority;
        if !still_resists {
            for row in engine.suspension.unblock_variable(w) {
                if let Some(eq) = engine.suspension.equation(row) {
                    engine.violations.unsuspend(eq.bound_var);
                }
            }
        }
    }

    let self_blocked: Vec<VarId> = engine.suspension.self_blocked_variables().collect();
    for w in self_blocked {
        let Some(entry) = engine.suspension.self_blocked(w) else { continue };
        let still_resists = engine.resistance.get_min_resistance(w) >= entry.resistance;
        if !still_resists {
            for row in engine.suspension.unblock_self(w) {
                if let Some(eq) = engine.suspension.equation(row) {
                    engine.violations.unsuspend(eq.bound_var);
                }
            }
        }
    }
}
