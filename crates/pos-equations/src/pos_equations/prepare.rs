//! Prepare phase: `prepareAndSolve` steps 1–9 (spec.md §4.4).

use super::PosEquations;
use crate::collaborators::{OrGroups, PosCalcContext, SegmentConstraints};
use crate::error::SolveResult;
use crate::ids::{RowId, VarId};
use crate::trace::{Direction, SolverObserver};
use crate::variables_by_resistance::CandidateEntry;
use indexmap::IndexSet;

/// Runs the prepare phase. Returns whether anything changed — if not, the
/// caller skips feasibility/optimization/post entirely (step 3).
pub(super) fn prepare<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    ctx: &mut impl PosCalcContext,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
) -> SolveResult<bool> {
    // Step 1.
    let repaired = engine.combination.repair_combinations(engine.config.zero_rounding);
    let mut structurally_touched: IndexSet<RowId> = engine.changed_equations.iter().copied().collect();
    structurally_touched.extend(repaired);
    for row_id in structurally_touched {
        recompute_row_inner_product(engine, row_id);
    }

    // Step 2.
    let had_new_variables = !engine.new_variables.is_empty();
    purge_removed_variables(engine);
    initialize_values(engine, ctx, segments, or_groups);

    // Step 3.
    let nothing_changed = !had_new_variables
        && segments.changes().is_empty()
        && engine.changed_equations.is_empty()
        && !engine.bound_free.has_pending_refresh();
    if nothing_changed {
        return Ok(false);
    }

    // Step 4.
    normalize_rows(engine);

    // Step 5.
    assign_bound_variables(engine);

    // Step 6.
    let trivially_resolved = trivial_error_reduction(engine, segments, or_groups);

    // Step 7.
    init_derivative(engine);

    // Step 8.
    finish_resistance_init(engine, segments, or_groups, &trivially_resolved);

    // Step 9.
    build_variables_by_resistance(engine);

    engine.changed_equations.clear();
    Ok(true)
}

/// Recomputes a row's inner product from scratch against the current
/// solution. Needed for any row whose *expanded* coefficients changed by a
/// path other than `eliminate`'s row-combination (a direct structural edit
/// via `set_equation`/`transfer_value`, or `repair_combinations`'s drift
/// correction) — those don't know the scalar relationship to an existing
/// tracked value the way a pivot exchange does, so there is nothing to
/// apply incrementally.
fn recompute_row_inner_product<O: SolverObserver>(engine: &mut PosEquations<O>, row_id: RowId) {
    let Some(row) = engine.combination.row(row_id) else { return };
    let value = row.dot(&|v| engine.solution.get(&v).copied().unwrap_or(0.0));
    let zr = engine.config.zero_rounding;
    engine.inner_products.calc_inner_product(row_id, value, zr);
}

/// A variable with no remaining occurrence in any combination row and no
/// bound assignment has left the system; purge it from every table it could
/// still be referenced in (spec.md §4.4 step 2, §3 Lifecycle).
fn purge_removed_variables<O: SolverObserver>(engine: &mut PosEquations<O>) {
    let removed: Vec<VarId> = engine
        .interner
        .ids()
        .filter(|&var| {
            engine.solution.contains_key(&var)
                && engine.combination.occurrence_count(var) == 0
                && !engine.bound_free.is_bound(var)
        })
        .collect();
    for var in removed {
        engine.solution.shift_remove(&var);
        engine.solution_changes.shift_remove(&var);
        engine.resistance.remove_variable(var);
        engine.violations.remove(var);
        engine.candidates.remove(var);
        engine.suspension.remove_variable(var);
    }
}

fn initialize_values<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    ctx: &mut impl PosCalcContext,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
) {
    let newly_born: Vec<VarId> = engine.new_variables.drain(..).collect();
    for var in newly_born {
        let last = ctx.last_value(var);
        let preferred = segments.preferred_value(var, last);
        let delta = preferred - engine.solution_value(var);
        engine.set_value(var, preferred);
        apply_value_change_to_inner_products(engine, var, delta);
        or_groups.update_variable_satisfaction(var, preferred, false);
        engine.resistance.calc_resistance(var, segments, or_groups);
    }

    let changed: Vec<VarId> = segments.changes().iter().copied().collect();
    for var in changed {
        let current = engine.solution_value(var);
        let preferred = segments.preferred_value(var, Some(current));
        let new_value = if segments.in_range(var, current) { current } else { preferred };
        let delta = new_value - current;
        engine.set_value(var, new_value);
        apply_value_change_to_inner_products(engine, var, delta);
        or_groups.update_variable_satisfaction(var, new_value, false);
        engine.resistance.calc_resistance(var, segments, or_groups);
    }
}

/// Seeds/updates `innerProducts` for every row `var` appears in after its
/// value moved by `delta` outside the normal feasibility/optimization move
/// path (new-variable birth, an external segment-driven re-init). Nothing
/// else in the engine recomputes a row's inner product from a value change
/// that didn't go through `reduce_error`'s commit step, so without this a
/// freshly interned variable's initial preference would never register as
/// equation error.
fn apply_value_change_to_inner_products<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    var: VarId,
    delta: f64,
) {
    if delta == 0.0 {
        return;
    }
    let zr = engine.config.zero_rounding;
    let rows: Vec<(RowId, f64)> = engine
        .combination
        .combination_component_index(var)
        .map(|row| (row, engine.combination.get_value(row, var)))
        .collect();
    for (row, coeff) in rows {
        engine.inner_products.add_to_products(row, coeff, delta, zr);
    }
}

fn normalize_rows<O: SolverObserver>(engine: &mut PosEquations<O>) {
    let threshold = engine.config.normalization_threshold;
    let ids: Vec<RowId> = engine.combination.row_ids().collect();
    for row_id in ids {
        let Some(row) = engine.combination.row(row_id) else { continue };
        let norm = row.norm();
        if norm <= 0.0 {
            continue;
        }
        if norm > threshold {
            engine.combination.normalize(row_id, 1.0 / norm);
        } else if norm < 1.0 / threshold {
            engine.combination.normalize(row_id, threshold);
        }
    }
}

/// Replays the `(row, scalar)` pairs an elimination/exchange produced into
/// the inner-product tracker, per `eliminate`'s row-combination rule
/// (spec.md §4.1).
pub(super) fn replay_elimination<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    pivot_row: RowId,
    applied: Vec<(RowId, f64)>,
) {
    let zr = engine.config.zero_rounding;
    for (other_row, scalar) in applied {
        engine.inner_products.add_vectors(other_row, pivot_row, scalar, zr);
    }
}

fn assign_bound_variables<O: SolverObserver>(engine: &mut PosEquations<O>) {
    let mut rows_to_check: IndexSet<RowId> = engine.changed_equations.iter().copied().collect();
    rows_to_check.extend(engine.bound_free.pending_refresh());

    for row_id in rows_to_check {
        let Some(row) = engine.combination.row(row_id) else {
            engine.bound_free.clear_refresh(row_id);
            continue;
        };
        if row.is_empty() {
            engine.bound_free.free_row(row_id);
            engine.bound_free.clear_refresh(row_id);
            continue;
        }

        if let Some(bound_var) = engine.bound_free.bound_var_of_row(row_id) {
            if row.contains(bound_var) {
                let applied = engine.combination.eliminate(bound_var, row_id);
                replay_elimination(engine, row_id, applied);
                engine.bound_free.clear_refresh(row_id);
                continue;
            }
            engine.bound_free.free_row(row_id);
        }

        if let Some(candidate) = find_bound_var_candidate(engine, row_id) {
            let applied = engine.combination.eliminate(candidate, row_id);
            replay_elimination(engine, row_id, applied);
            engine.bound_free.set_bound(row_id, candidate);
            engine.observer.on_bound_assigned(candidate, row_id);
        }
        engine.bound_free.clear_refresh(row_id);
    }
}

/// `findBoundVarCandidate` (spec.md §4.4): among the variables of a row
/// lacking (or having lost) a bound variable, pick the one whose resistance
/// pair is Pareto-minimal, breaking ties by fewest combination-row
/// occurrences.
fn find_bound_var_candidate<O: SolverObserver>(
    engine: &PosEquations<O>,
    row_id: RowId,
) -> Option<VarId> {
    let row = engine.combination.row(row_id)?;
    if row.is_empty() {
        return None;
    }
    let ip = engine.inner_products.get(row_id);
    let d: i32 = if ip > 0.0 {
        -1
    } else if ip < 0.0 {
        1
    } else {
        0
    };

    let mut frontier: Vec<(VarId, (f64, f64))> = Vec::new();
    for (var, coeff) in row.iter() {
        let pair = resistance_pair(engine, var, coeff, d);
        frontier.retain(|&(_, p)| !dominates(&pair, &p));
        let dominated = frontier.iter().any(|&(_, p)| dominates(&p, &pair));
        if !dominated {
            frontier.push((var, pair));
        }
    }

    frontier
        .into_iter()
        .min_by_key(|&(var, _)| engine.combination.occurrence_count(var))
        .map(|(var, _)| var)
}

fn resistance_pair<O: SolverObserver>(
    engine: &PosEquations<O>,
    var: VarId,
    coeff: f64,
    d: i32,
) -> (f64, f64) {
    if d != 0 {
        let r = if coeff * d as f64 > 0.0 {
            engine.resistance.get_down_resistance(var)
        } else {
            engine.resistance.get_up_resistance(var)
        };
        (r, r)
    } else {
        let (down_if_positive, up_if_positive) = if coeff > 0.0 {
            (
                engine.resistance.get_down_resistance(var),
                engine.resistance.get_up_resistance(var),
            )
        } else {
            (
                engine.resistance.get_up_resistance(var),
                engine.resistance.get_down_resistance(var),
            )
        };
        (down_if_positive, up_if_positive)
    }
}

fn dominates(a: &(f64, f64), b: &(f64, f64)) -> bool {
    a.0 <= b.0 && a.1 <= b.1 && (a.0 < b.0 || a.1 < b.1)
}

/// Step 6: rows whose bound variable already offers the least resistance of
/// anyone in the row are settled immediately, without going through the
/// resistance-reduction machinery — there is nothing that pivot-exchange
/// could hand the row to instead, so deferring would only delay the
/// inevitable. The common case is a bound variable with no resistance at
/// all (`-inf`); a bound variable pinned alongside it (e.g. a fixed anchor)
/// never changes that comparison, since `+inf` can never be the minimum.
fn trivial_error_reduction<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
) -> Vec<VarId> {
    let mut moved = Vec::new();
    let rows: Vec<RowId> = engine.combination.row_ids().collect();
    for row_id in rows {
        let error = engine.inner_products.get(row_id);
        if error == 0.0 {
            continue;
        }
        let Some(bound_var) = engine.bound_free.bound_var_of_row(row_id) else { continue };
        let coeff = engine.combination.get_value(row_id, bound_var);
        if coeff == 0.0 {
            continue;
        }
        let Some(row) = engine.combination.row(row_id) else { continue };
        let bound_resistance = engine.resistance.get_min_resistance(bound_var);
        let best_alternative = row
            .iter()
            .filter(|&(v, _)| v != bound_var)
            .map(|(v, _)| engine.resistance.get_min_resistance(v))
            .fold(f64::INFINITY, f64::min);
        if bound_resistance > best_alternative {
            continue;
        }
        let delta = -error / coeff;
        let new_value = engine.solution_value(bound_var) + delta;
        engine.set_value(bound_var, new_value);
        engine.inner_products.set_to_zero(row_id);
        or_groups.update_variable_satisfaction(bound_var, new_value, false);
        engine.resistance.calc_resistance(bound_var, segments, or_groups);
        moved.push(bound_var);
    }
    moved
}

/// Step 7: `d[w] = sum over rows r of sign(e_r) * c_{r,w}`, nonzero entries
/// only. Also used by the resistance-reduction pivot loop to refresh the
/// derivative vector after a structural exchange, in place of the
/// incremental row-combination update spec.md §4.6 describes — see
/// DESIGN.md for that trade-off.
pub(super) fn init_derivative<O: SolverObserver>(engine: &mut PosEquations<O>) {
    engine.derivative.clear();
    let zr = engine.config.zero_rounding;
    let rows: Vec<RowId> = engine.inner_products.nonzero_rows().collect();
    for row_id in rows {
        let error = engine.inner_products.get(row_id);
        let sign = if error > 0.0 {
            1.0
        } else if error < 0.0 {
            -1.0
        } else {
            continue;
        };
        let Some(row) = engine.combination.row(row_id) else { continue };
        for (var, coeff) in row.iter() {
            let entry = engine.derivative.entry(var).or_insert(0.0);
            *entry += sign * coeff;
            if entry.abs() <= zr {
                engine.derivative.shift_remove(&var);
            }
        }
    }
}

/// Step 8: finish any pending total/sat-or-group resistance work and bring
/// the violation and suspension tables in line with the freshly initialized
/// values.
fn finish_resistance_init<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &mut impl SegmentConstraints,
    or_groups: &mut impl OrGroups,
    trivially_resolved: &[VarId],
) {
    let pending: Vec<VarId> = engine
        .resistance
        .need_recalc_total_for_violated_or_groups()
        .iter()
        .copied()
        .collect();
    for var in pending {
        engine.resistance.calc_resistance(var, segments, or_groups);
        engine.resistance.clear_total_resistance(var);
    }

    reconcile_violations(engine, segments, trivially_resolved);
}

/// Checks every variable with a nonzero error-derivative (still-erroring
/// rows, about to be handled by feasibility) plus every variable step 6 just
/// settled directly — a row zeroed out in step 6 never appears in the
/// derivative, so without the latter a bound variable forced past its own
/// segment there would never be flagged as violating.
fn reconcile_violations<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &impl SegmentConstraints,
    trivially_resolved: &[VarId],
) {
    let mut vars: Vec<VarId> = engine.derivative.keys().copied().collect();
    vars.extend(trivially_resolved.iter().copied());
    for var in vars {
        let value = engine.solution_value(var);
        if segments.in_range(var, value) {
            engine.violations.remove(var);
            continue;
        }
        let target = segments.preferred_value(var, Some(value));
        // The direction the variable is actually displaced toward, not the
        // corrective direction optimize() will move it in (its opposite) —
        // this is the boundary the violation is pressing against.
        let Some(violated_direction) = Direction::from_sign(value - target) else { continue };
        let priority = engine.resistance.get_resistance(var, violated_direction);
        engine.violations.set(var, target, priority);
        engine.resistance.mark_violation_changed(var);
    }
}

/// Step 9: one candidate entry per variable with nonzero error-derivative.
pub(super) fn build_variables_by_resistance<O: SolverObserver>(engine: &mut PosEquations<O>) {
    engine.candidates.clear();
    let entries: Vec<(VarId, f64)> =
        engine.derivative.iter().map(|(&v, &d)| (v, d)).collect();
    for (var, d) in entries {
        if engine.bound_free.is_bound(var) {
            continue;
        }
        let Some(dir) = Direction::from_sign(-d) else { continue };
        let own_resistance = engine.resistance.get_resistance_with_sat_or_groups(var, dir);
        let total = super::resistance_reduction::search_total_resistance(engine, var, dir);
        engine.candidates.upsert(CandidateEntry {
            variable: var,
            direction: dir,
            own_resistance,
            total_resistance: total.resistance,
            resisting_var: total.resisting_var,
            resisting_or_group: total.resisting_or_group,
        });
    }
}
