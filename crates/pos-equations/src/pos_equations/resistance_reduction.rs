//! Resistance-reduction inner loop (spec.md §4.6): drives the current pivot
//! candidate's own resistance up to its total resistance by exchanging it
//! with the bound variable responsible, so that moving it is globally
//! permissible.

use super::prepare::{build_variables_by_resistance, init_derivative, replay_elimination};
use super::PosEquations;
use crate::collaborators::{OrGroups, SegmentConstraints};
use crate::ids::{RowId, VarId};
use crate::resistance::TotalResistance;
use crate::trace::{Direction, SolverObserver};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ResistanceOutcome {
    /// The current pivot candidate's own resistance is now minimal —
    /// nothing in `blocked`/`selfBlocked` form, safe to move.
    Minimal,
    /// The candidate list is empty.
    Empty,
    /// Anti-cycling tripped; caller accepts the current state as the best
    /// seen and proceeds with error reduction anyway.
    LoopDetected,
}

/// `getTotalResistance(v, dir)`'s search: walks every zero-error row `v`
/// appears in, and for each takes the resistance of that row's bound
/// variable in the direction it would be forced to move — the largest such
/// induced resistance, together with which variable produced it (spec.md §3
/// "Total resistance"). Single-hop: the bound variable's own resistance in
/// the induced direction is used directly, not recursively searched through
/// further zero-error rows — see DESIGN.md.
pub(super) fn search_total_resistance<O: SolverObserver>(
    engine: &PosEquations<O>,
    var: VarId,
    dir: Direction,
) -> TotalResistance {
    let own = engine.resistance.get_resistance(var, dir);
    let mut best = TotalResistance::own(own);

    for row in engine.combination.combination_component_index(var) {
        if engine.inner_products.get(row).abs() > engine.config.zero_rounding {
            continue;
        }
        let Some(bound) = engine.bound_free.bound_var_of_row(row) else { continue };
        if bound == var {
            continue;
        }
        let c_v = engine.combination.get_value(row, var);
        let c_b = engine.combination.get_value(row, bound);
        if c_v == 0.0 || c_b == 0.0 {
            continue;
        }
        let induced_sign = -(c_v / c_b) * dir.sign();
        let Some(induced_dir) = Direction::from_sign(induced_sign) else { continue };
        let resistance = engine.resistance.get_resistance_with_sat_or_groups(bound, induced_dir);
        if resistance > best.resistance {
            best = TotalResistance {
                resistance,
                resisting_var: Some(bound),
                resisting_or_group: None,
            };
        }
    }
    best
}

enum SatGroupOutcome {
    /// An exchange with `VarId` was scheduled; fall through to the normal
    /// exchange step.
    Scheduled(VarId),
    /// No useful exchange found; `var` was repositioned under its
    /// sat-or-group-augmented key instead.
    Repositioned,
}

fn shares_satisfied_or_group(or_groups: &impl OrGroups, var: VarId, other: VarId) -> bool {
    or_groups.or_groups_of(var).into_iter().any(|g| {
        or_groups.is_satisfied_on_other_variable(g, var)
            && or_groups.satisfied_variables(g).contains(&other)
    })
}

/// `reduceResistanceWithSatisfiedOrGroupVariable` (spec.md §4.6).
fn reduce_with_sat_or_group<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    or_groups: &impl OrGroups,
    var: VarId,
    dir: Direction,
) -> SatGroupOutcome {
    let sat_res = engine.resistance.get_sat_or_group_resistance(var, dir);
    let second_last_own = engine
        .candidates
        .second_last()
        .map(|e| e.own_resistance)
        .unwrap_or(f64::INFINITY);
    let opt_priority = engine.optimization.map(|c| c.priority).unwrap_or(f64::INFINITY);
    let upper_bound = sat_res.min(second_last_own).min(opt_priority);

    let d_v = engine.derivative.get(&var).copied().unwrap_or(0.0);
    let mut best: Option<(RowId, VarId, f64)> = None;

    for row in engine.combination.combination_component_index(var).collect::<Vec<_>>() {
        let Some(bound) = engine.bound_free.bound_var_of_row(row) else { continue };
        if bound == var || !shares_satisfied_or_group(or_groups, var, bound) {
            continue;
        }
        let Some(row_data) = engine.combination.row(row) else { continue };
        let c_v = row_data.coefficient(var);
        if c_v == 0.0 {
            continue;
        }
        for (w, c_w) in row_data.iter() {
            if w == var || w == bound || engine.bound_free.is_bound(w) {
                continue;
            }
            let d_w = engine.derivative.get(&w).copied().unwrap_or(0.0);
            let d_w_prime = d_w - d_v * c_w / c_v;
            let (Some(old_dir), Some(new_dir)) =
                (Direction::from_sign(-d_w), Direction::from_sign(-d_w_prime))
            else {
                continue;
            };
            if old_dir == new_dir {
                continue;
            }
            let candidate_resistance = engine.resistance.get_resistance_with_sat_or_groups(w, new_dir);
            if candidate_resistance < upper_bound
                && best.map_or(true, |(_, _, r)| candidate_resistance < r)
            {
                best = Some((row, bound, candidate_resistance));
            }
        }
    }

    match best {
        Some((_, bound, _)) => {
            if let Some(mut entry) = engine.candidates.get(var).copied() {
                entry.resisting_var = Some(bound);
                engine.candidates.upsert(entry);
            }
            SatGroupOutcome::Scheduled(bound)
        }
        None => {
            engine.candidates.reposition_to_sat_or_group(var, sat_res);
            SatGroupOutcome::Repositioned
        }
    }
}

/// Exchanges `free` (currently a pivot candidate) with `bound` in `row`: the
/// row's bound variable becomes `free`, and `bound` rejoins the free set.
/// The derivative vector and the candidate list are fully rebuilt afterward
/// rather than updated incrementally (DESIGN.md trade-off).
fn exchange<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &impl SegmentConstraints,
    or_groups: &impl OrGroups,
    free: VarId,
    bound: VarId,
    row: RowId,
) {
    engine.bound_free.free_row(row);
    engine.bound_free.set_bound(row, free);
    let applied = engine.combination.eliminate(free, row);
    replay_elimination(engine, row, applied);
    tracing::trace!(?free, ?bound, ?row, "pivot exchange");
    engine.observer.on_pivot(free, bound, row);
    engine.resistance.mark_total_resistance_changed(free);
    engine.resistance.mark_total_resistance_changed(bound);

    init_derivative(engine);
    build_variables_by_resistance(engine);
    let _ = (segments, or_groups);
}

/// `reduceResistance()` (spec.md §4.6).
pub(super) fn reduce_resistance<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &impl SegmentConstraints,
    or_groups: &impl OrGroups,
) -> ResistanceOutcome {
    let mut history: HashMap<(VarId, VarId), u32> = HashMap::new();

    loop {
        let Some(last) = engine.candidates.last().copied() else {
            return ResistanceOutcome::Empty;
        };
        let var = last.variable;
        let dir = last.direction;

        if let Some(ctx) = engine.optimization {
            if ctx.priority <= last.own_resistance {
                return ResistanceOutcome::Minimal;
            }
        }

        let bound_to_exchange = if last.own_resistance < last.total_resistance {
            last.resisting_var
        } else if engine.resistance.get_sat_or_group_resistance(var, dir) <= last.own_resistance {
            return ResistanceOutcome::Minimal;
        } else {
            match reduce_with_sat_or_group(engine, or_groups, var, dir) {
                SatGroupOutcome::Scheduled(bound) => Some(bound),
                SatGroupOutcome::Repositioned => continue,
            }
        };

        let Some(bound) = bound_to_exchange else {
            return ResistanceOutcome::Minimal;
        };
        let Some(row) = engine.bound_free.bound_row_of(bound) else {
            return ResistanceOutcome::Minimal;
        };

        let key = (var, bound);
        let count = history.entry(key).or_insert(0);
        *count += 1;
        if *count > engine.config.max_repeat_exchanges {
            tracing::debug!(?var, ?bound, repeats = *count, "anti-cycling limit tripped");
            engine.observer.on_anti_cycle_detected(var, bound);
            return ResistanceOutcome::LoopDetected;
        }

        exchange(engine, segments, or_groups, var, bound, row);
    }
}
