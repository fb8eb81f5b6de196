//! `Resistance`: per-variable up/down resistance, satisfied-or-group
//! contribution, and the change sets a solve pass must react to
//! (spec.md §4.3). Interface-level per spec.md §1 — this module owns the
//! per-variable state and the collaborator calls that produce it; the
//! induced total-resistance *search* over the equation system is the pivot
//! engine's job (`pos_equations::resistance_reduction`), which writes its
//! results back into [`TotalResistanceCache`].

mod entry;
mod total;

pub use entry::ResistanceEntry;
pub use total::{TotalResistance, TotalResistanceCache};

use crate::collaborators::{OrGroups, SegmentConstraints};
use crate::ids::VarId;
use crate::trace::Direction;
use indexmap::{IndexMap, IndexSet};

#[derive(Default)]
pub struct Resistance {
    entries: IndexMap<VarId, ResistanceEntry>,
    total: TotalResistanceCache,

    resistance_changed: IndexSet<VarId>,
    sat_or_group_resistance_changed: IndexSet<VarId>,
    total_resistance_changed: IndexSet<VarId>,
    violation_changed: IndexSet<VarId>,
    need_recalc_total_for_violated_or_groups: IndexSet<VarId>,
}

impl Resistance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes `v`'s own and satisfied-or-group resistance from the
    /// current value and the segment/or-group collaborators
    /// (`calcResistance`).
    pub fn calc_resistance(
        &mut self,
        var: VarId,
        segments: &impl SegmentConstraints,
        or_groups: &impl OrGroups,
    ) {
        let mut entry = ResistanceEntry::default();
        entry.set_own(Direction::Up, segments.resistance(var, Direction::Up));
        entry.set_own(Direction::Down, segments.resistance(var, Direction::Down));

        if segments.variable_has_or_groups(var) {
            let sat_priority = or_groups
                .or_groups_of(var)
                .into_iter()
                .filter(|&g| or_groups.is_satisfied_on_other_variable(g, var))
                .map(|g| or_groups.group_priority(g))
                .fold(f64::NEG_INFINITY, f64::max);
            entry.set_sat(Direction::Up, sat_priority);
            entry.set_sat(Direction::Down, sat_priority);
        }

        let changed = self
            .entries
            .get(&var)
            .map(|prev| prev.own != entry.own)
            .unwrap_or(true);
        let sat_changed = self
            .entries
            .get(&var)
            .map(|prev| prev.sat_or_group != entry.sat_or_group)
            .unwrap_or(true);

        self.entries.insert(var, entry);
        if changed {
            self.resistance_changed.insert(var);
            self.total_resistance_changed.insert(var);
        }
        if sat_changed {
            self.sat_or_group_resistance_changed.insert(var);
        }
    }

    /// Re-derives `v`'s entry without assuming anything changed — used after
    /// structural edits that might not have moved `v` itself
    /// (`refreshEntry`).
    pub fn refresh_entry(
        &mut self,
        var: VarId,
        segments: &impl SegmentConstraints,
        or_groups: &impl OrGroups,
    ) {
        self.calc_resistance(var, segments, or_groups);
    }

    pub fn set_stable_value(&mut self, var: VarId, value: f64, segments: &mut impl SegmentConstraints) {
        segments.set_stable_value(var, value);
        self.total_resistance_changed.insert(var);
    }

    pub fn get_up_resistance(&self, var: VarId) -> f64 {
        self.entries.get(&var).map(|e| e.own_in(Direction::Up)).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn get_down_resistance(&self, var: VarId) -> f64 {
        self.entries.get(&var).map(|e| e.own_in(Direction::Down)).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn get_min_resistance(&self, var: VarId) -> f64 {
        self.entries.get(&var).map(|e| e.min_own()).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn get_resistance(&self, var: VarId, dir: Direction) -> f64 {
        self.entries.get(&var).map(|e| e.own_in(dir)).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn get_resistance_with_sat_or_groups(&self, var: VarId, dir: Direction) -> f64 {
        self.entries.get(&var).map(|e| e.with_sat_or_group_in(dir)).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn get_sat_or_group_resistance(&self, var: VarId, dir: Direction) -> f64 {
        self.entries.get(&var).map(|e| e.sat_in(dir)).unwrap_or(f64::NEG_INFINITY)
    }

    pub fn get_total_resistance(&self, var: VarId, dir: Direction) -> Option<TotalResistance> {
        self.total.get(var, dir)
    }

    pub fn set_total_resistance(&mut self, var: VarId, dir: Direction, value: TotalResistance) {
        self.total.set(var, dir, value);
    }

    pub fn clear_total_resistance(&mut self, var: VarId) {
        self.total.clear_var(var);
    }

    // -- change sets -------------------------------------------------

    pub fn resistance_changed(&self) -> &IndexSet<VarId> {
        &self.resistance_changed
    }

    pub fn sat_or_group_resistance_changed(&self) -> &IndexSet<VarId> {
        &self.sat_or_group_resistance_changed
    }

    pub fn total_resistance_changed(&self) -> &IndexSet<VarId> {
        &self.total_resistance_changed
    }

    pub fn violation_changed(&self) -> &IndexSet<VarId> {
        &self.violation_changed
    }

    pub fn need_recalc_total_for_violated_or_groups(&self) -> &IndexSet<VarId> {
        &self.need_recalc_total_for_violated_or_groups
    }

    pub fn mark_violation_changed(&mut self, var: VarId) {
        self.violation_changed.insert(var);
    }

    pub fn mark_needs_recalc_for_violated_or_group(&mut self, var: VarId) {
        self.need_recalc_total_for_violated_or_groups.insert(var);
    }

    pub fn clear_changes(&mut self) {
        self.resistance_changed.clear();
        self.sat_or_group_resistance_changed.clear();
        self.total_resistance_changed.clear();
        self.violation_changed.clear();
        self.need_recalc_total_for_violated_or_groups.clear();
    }

    pub fn mark_total_resistance_changed(&mut self, var: VarId) {
        self.total_resistance_changed.insert(var);
    }

    /// Purges a removed variable from every table (spec.md §4.4 step 2).
    pub fn remove_variable(&mut self, var: VarId) {
        self.entries.shift_remove(&var);
        self.total.clear_var(var);
        self.resistance_changed.shift_remove(&var);
        self.sat_or_group_resistance_changed.shift_remove(&var);
        self.total_resistance_changed.shift_remove(&var);
        self.violation_changed.shift_remove(&var);
        self.need_recalc_total_for_violated_or_groups.shift_remove(&var);
    }

    /// Clears all cached total-resistance entries (spec.md §4.8:
    /// "Total-resistance bookkeeping for all variables is cleared").
    pub fn clear_all_total_resistance(&mut self) {
        self.total.clear_all();
    }
}
