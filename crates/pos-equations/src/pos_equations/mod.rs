//! `PosEquations`: the pivot engine that orchestrates equation edits,
//! bound-variable assignment, resistance-reduction pivots, error-reduction
//! moves, and priority optimization (spec.md §2, §4, §6).

mod feasibility;
mod optimization;
mod post;
mod prepare;
mod resistance_reduction;

use crate::bound_free::BoundFree;
use crate::collaborators::{OrGroups, PosCalcContext, SegmentConstraints};
use crate::combination_vectors::CombinationVectors;
use crate::config::SolverConfig;
use crate::equation::Row;
use crate::error::SolveResult;
use crate::ids::{RowId, VarId, VariableInterner};
use crate::inner_products::InnerProductTracker;
use crate::resistance::Resistance;
use crate::suspension::SuspensionState;
use crate::trace::{Direction, NullObserver, SolverObserver};
use crate::variables_by_resistance::VariablesByResistance;
use crate::violations::Violations;
use indexmap::{IndexMap, IndexSet};

/// The bookkeeping context that tracks an in-progress priority optimization
/// (spec.md §4.7 step 6: "Set `optimizationVar`, `optimizationPriority`,
/// `optimizationDir`, `optimizationTarget`").
#[derive(Debug, Clone, Copy)]
pub(crate) struct OptimizationContext {
    pub var: VarId,
    pub priority: f64,
    pub dir: Direction,
    pub target: f64,
}

/// Outputs of one `prepare_and_solve` pass beyond the mutation of the
/// solution itself — the change sets the Resistance component is required
/// to maintain (spec.md §4.3), surfaced so a caller/test can assert on them
/// without reaching into private engine state (SPEC_FULL.md §4.1).
#[derive(Debug, Default, Clone)]
pub struct SolveReport {
    pub solution_changes: Vec<VarId>,
    pub resistance_changed: Vec<VarId>,
    pub sat_or_group_resistance_changed: Vec<VarId>,
    pub total_resistance_changed: Vec<VarId>,
    pub violation_changed: Vec<VarId>,
    /// Non-suspended-at-start-of-pass violations still present at the end —
    /// a caller distinguishes "solved" from "well-formed but unsatisfiable"
    /// (spec.md §7(2)) by whether any of these remain suspended.
    pub remaining_violations: Vec<VarId>,
}

pub struct PosEquations<O: SolverObserver = NullObserver> {
    pub(crate) config: SolverConfig,
    pub(crate) interner: VariableInterner,
    pub(crate) combination: CombinationVectors,
    pub(crate) inner_products: InnerProductTracker,
    pub(crate) resistance: Resistance,
    pub(crate) violations: Violations,
    pub(crate) candidates: VariablesByResistance,
    pub(crate) suspension: SuspensionState,
    pub(crate) bound_free: BoundFree,
    pub(crate) solution: IndexMap<VarId, f64>,
    pub(crate) solution_changes: IndexSet<VarId>,
    /// The error-derivative vector `∇‖e‖₁` (spec.md §4.4 step 7): signed sum
    /// of rows weighted by `sign(e_r)`, only nonzero entries kept.
    pub(crate) derivative: IndexMap<VarId, f64>,
    /// Rows structurally touched since the last `prepare_and_solve`
    /// (`changedEquations`).
    pub(crate) changed_equations: IndexSet<RowId>,
    /// Variables born since the last `prepare_and_solve` and not yet given
    /// an initial value.
    pub(crate) new_variables: IndexSet<VarId>,
    pub(crate) optimization: Option<OptimizationContext>,
    pub(crate) observer: O,
}

impl PosEquations<NullObserver> {
    pub fn new(config: SolverConfig) -> Self {
        Self::with_observer(config, NullObserver)
    }
}

impl<O: SolverObserver> PosEquations<O> {
    pub fn with_observer(config: SolverConfig, observer: O) -> Self {
        PosEquations {
            config,
            interner: VariableInterner::new(),
            combination: CombinationVectors::new(),
            inner_products: InnerProductTracker::new(),
            resistance: Resistance::new(),
            violations: Violations::new(),
            candidates: VariablesByResistance::new(),
            suspension: SuspensionState::new(),
            bound_free: BoundFree::new(),
            solution: IndexMap::new(),
            solution_changes: IndexSet::new(),
            derivative: IndexMap::new(),
            changed_equations: IndexSet::new(),
            new_variables: IndexSet::new(),
            optimization: None,
            observer,
        }
    }

    fn intern(&mut self, name: &str) -> VarId {
        let (id, born) = self.interner.intern(name);
        if born {
            self.new_variables.insert(id);
        }
        id
    }

    fn build_row(&mut self, entries: &[(&str, f64)]) -> Row {
        let resolved: Vec<(VarId, f64)> = entries
            .iter()
            .filter(|&&(_, c)| c != 0.0)
            .map(|&(name, c)| (self.intern(name), c))
            .collect();
        Row::from_entries(resolved)
    }

    /// `addEquation(entries) -> rowId` (spec.md §6). Zero entries are
    /// dropped by [`Row::from_entries`].
    pub fn add_equation(&mut self, entries: &[(&str, f64)]) -> RowId {
        let row = self.build_row(entries);
        let row_id = self.combination.new_vector(row);
        self.changed_equations.insert(row_id);
        self.bound_free.queue_refresh(row_id);
        row_id
    }

    /// `setEquation(rowId, entries)`: replaces all columns of a base row.
    pub fn set_equation(&mut self, row_id: RowId, entries: &[(&str, f64)]) {
        let row = self.build_row(entries);
        let affected = self.combination.set_vector(row_id, row);
        self.changed_equations.extend(affected.iter().copied());
        self.changed_equations.insert(row_id);
        for row in affected {
            self.bound_free.queue_refresh(row);
        }
        self.bound_free.queue_refresh(row_id);
    }

    /// `removeEquation(rowId)`.
    pub fn remove_equation(&mut self, row_id: RowId) {
        if let Some(dropped) = self.combination.remove_vector(row_id) {
            if let Some(freed_var) = self.bound_free.free_row(dropped) {
                self.bound_free.queue_refresh(dropped);
                self.resistance.mark_total_resistance_changed(freed_var);
            }
            self.changed_equations.insert(dropped);
        }
        self.changed_equations.shift_remove(&row_id);
        self.inner_products.remove(row_id);
    }

    /// `transferValue(rowId, prevName, prevValue, newName, newValue)`:
    /// replace one column of a base row.
    pub fn transfer_value(
        &mut self,
        row_id: RowId,
        prev_name: &str,
        prev_value: f64,
        new_name: &str,
        new_value: f64,
    ) {
        let Some(base_row) = self.combination.base_row(row_id) else { return };
        let mut entries: Vec<(VarId, f64)> = base_row.iter().collect();
        let prev_id = self.intern(prev_name);
        entries.retain(|&(v, c)| !(v == prev_id && c == prev_value));
        let new_id = self.intern(new_name);
        if new_value != 0.0 {
            entries.push((new_id, new_value));
        }
        let row = Row::from_entries(entries);
        let affected = self.combination.set_vector(row_id, row);
        self.changed_equations.extend(affected.iter().copied());
        self.changed_equations.insert(row_id);
        self.bound_free.queue_refresh(row_id);
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.interner.lookup(name).is_some()
    }

    /// Looks up the dense id assigned to `name`, if it has ever appeared in
    /// an equation — the handle a caller's `SegmentConstraints`/`OrGroups`/
    /// `PosCalcContext` implementations key their own per-variable state on.
    pub fn variable_id(&self, name: &str) -> Option<VarId> {
        self.interner.lookup(name)
    }

    /// `getSolution() -> mapping variable -> value`. Variables absent from
    /// the map are implicitly 0 (spec.md §6).
    pub fn get_solution(&self) -> IndexMap<String, f64> {
        self.solution
            .iter()
            .map(|(&var, &value)| (self.interner.name(var).to_string(), value))
            .collect()
    }

    pub fn solution_value(&self, var: VarId) -> f64 {
        self.solution.get(&var).copied().unwrap_or(0.0)
    }

    /// Caller acknowledges it has read `solutionChanges`.
    pub fn clear_solution_changes(&mut self) {
        self.solution_changes.clear();
    }

    /// Runs one full solve pass: prepare, feasibility, optimization, post
    /// (spec.md §5 "within one solve, the order is fixed").
    #[tracing::instrument(level = "debug", skip_all, fields(rows = self.combination.row_ids().count()))]
    pub fn prepare_and_solve(
        &mut self,
        ctx: &mut impl PosCalcContext,
        segments: &mut impl SegmentConstraints,
        or_groups: &mut impl OrGroups,
    ) -> SolveResult<SolveReport> {
        self.resistance.clear_changes();

        self.observer.on_phase_start("prepare");
        let anything_changed = tracing::debug_span!("prepare")
            .in_scope(|| prepare::prepare(self, ctx, segments, or_groups))?;
        self.observer.on_phase_end("prepare");

        if !anything_changed {
            tracing::debug!("nothing changed since the last pass, skipping solve");
            return Ok(SolveReport::default());
        }

        self.observer.on_phase_start("feasibility");
        tracing::debug_span!("feasibility")
            .in_scope(|| feasibility::find_feasible_solution(self, segments, or_groups))?;
        self.observer.on_phase_end("feasibility");

        self.observer.on_phase_start("optimization");
        tracing::debug_span!("optimization")
            .in_scope(|| optimization::optimize(self, segments, or_groups))?;
        self.observer.on_phase_end("optimization");

        self.observer.on_phase_start("post");
        tracing::debug_span!("post").in_scope(|| post::set_resistance_for_next_round(self, segments));
        self.observer.on_phase_end("post");

        let report = self.build_report();
        tracing::debug!(
            solution_changes = report.solution_changes.len(),
            remaining_violations = report.remaining_violations.len(),
            "solve pass complete"
        );
        Ok(report)
    }

    fn build_report(&self) -> SolveReport {
        SolveReport {
            solution_changes: self.solution_changes.iter().copied().collect(),
            resistance_changed: self.resistance.resistance_changed().iter().copied().collect(),
            sat_or_group_resistance_changed: self
                .resistance
                .sat_or_group_resistance_changed()
                .iter()
                .copied()
                .collect(),
            total_resistance_changed: self
                .resistance
                .total_resistance_changed()
                .iter()
                .copied()
                .collect(),
            violation_changed: self.resistance.violation_changed().iter().copied().collect(),
            remaining_violations: self
                .violations
                .iter_by_priority_desc()
                .filter(|v| v.suspended)
                .map(|v| v.variable)
                .collect(),
        }
    }

    pub(crate) fn zero_rounding(&self) -> f64 {
        self.config.zero_rounding
    }

    pub(crate) fn set_value(&mut self, var: VarId, value: f64) {
        let flattened = if value.abs() <= self.config.zero_rounding { 0.0 } else { value };
        let changed = self.solution.get(&var).copied() != Some(flattened);
        self.solution.insert(var, flattened);
        if changed {
            self.solution_changes.insert(var);
        }
    }
}
