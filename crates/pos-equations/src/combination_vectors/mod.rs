//! `CombinationVectors`: the base set B plus the linearly-independent
//! combination set C, kept in reduced row-echelon form (spec.md §4.1).
//!
//! This module is deliberately interface-level per spec.md §1 ("described at
//! the interface level; their internal representations are left to the
//! implementer") — the representation chosen here (explicit combination
//! coefficients alongside the expanded row, an inverted column index) is one
//! valid implementation, generalized from the teacher's `constraint_graph`
//! module which keeps a comparable split between rigid "blocks" and the
//! variables that compose them.

mod base;
mod combination;

pub use base::BaseSet;
pub use combination::{Combo, CombinationRow, CombinationSet};

use crate::equation::Row;
use crate::ids::{RowId, VarId};
use indexmap::{IndexMap, IndexSet};

pub struct CombinationVectors {
    base: BaseSet,
    combinations: CombinationSet,
    /// `var -> rows of C where var has a nonzero coefficient`
    /// (`combinationComponentIndex`, spec.md §4.1).
    column_index: IndexMap<VarId, IndexSet<RowId>>,
}

impl Default for CombinationVectors {
    fn default() -> Self {
        Self::new()
    }
}

impl CombinationVectors {
    pub fn new() -> Self {
        CombinationVectors {
            base: BaseSet::new(),
            combinations: CombinationSet::new(),
            column_index: IndexMap::new(),
        }
    }

    fn reindex(&mut self, row_id: RowId, old: Option<&Row>, new: &Row) {
        if let Some(old) = old {
            for (var, _) in old.iter() {
                if !new.contains(var) {
                    if let Some(set) = self.column_index.get_mut(&var) {
                        set.shift_remove(&row_id);
                    }
                }
            }
        }
        for (var, _) in new.iter() {
            self.column_index.entry(var).or_default().insert(row_id);
        }
    }

    /// Adds a new base row, and a copy of it as the row's initial
    /// combination (`newVector`). Base row and combination row share
    /// `row_id` — the combination's initial expression is the identity
    /// combination over itself.
    pub fn new_vector(&mut self, row: Row) -> RowId {
        let row_id = self.base.insert(row.clone());
        self.reindex(row_id, None, &row);
        self.combinations.insert(
            row_id,
            CombinationRow {
                combo: Combo::identity(row_id),
                row,
            },
        );
        row_id
    }

    /// Replaces a base row, propagating the change to every combination row
    /// that references it (`setVector`). Returns the ids of combination rows
    /// whose expanded value changed.
    pub fn set_vector(&mut self, base_id: RowId, row: Row) -> Vec<RowId> {
        self.base.set(base_id, row);
        self.recompute_dependents(base_id)
    }

    fn recompute_dependents(&mut self, base_id: RowId) -> Vec<RowId> {
        let affected: Vec<RowId> = self
            .combinations
            .iter()
            .filter(|(_, cr)| cr.combo.coefficient(base_id) != 0.0)
            .map(|(&id, _)| id)
            .collect();
        for &row_id in &affected {
            self.reconstruct(row_id);
        }
        affected
    }

    fn reconstruct(&mut self, row_id: RowId) {
        let combo = self.combinations[&row_id].combo.clone();
        let mut rebuilt = Row::new();
        for (base_id, coeff) in combo.iter() {
            if let Some(base_row) = self.base.get(base_id) {
                rebuilt.add_scaled(base_row, coeff);
            }
        }
        let old = self.combinations[&row_id].row.clone();
        self.reindex(row_id, Some(&old), &rebuilt);
        self.combinations.get_mut(&row_id).unwrap().row = rebuilt;
    }

    /// Removes a base row, dropping exactly one combination row so the set
    /// remains linearly independent (spec.md §4.1 "Removal-of-one-combination
    /// algorithm"). Returns the id of the combination row that was dropped —
    /// the caller (the pivot engine) must free that row's bound variable, if
    /// any, since bound/free bookkeeping lives outside this component.
    pub fn remove_vector(&mut self, base_id: RowId) -> Option<RowId> {
        self.base.remove(base_id)?;

        let mut candidates: Vec<(RowId, f64)> = self
            .combinations
            .iter()
            .map(|(&id, cr)| (id, cr.combo.coefficient(base_id)))
            .filter(|&(_, c)| c != 0.0)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap());
        let (selected, selected_coeff) = candidates[0];

        for &(row_id, coeff) in candidates.iter().skip(1) {
            let scalar = -coeff / selected_coeff;
            self.add_comb_to_comb_vector(row_id, selected, scalar);
        }

        let removed = self.combinations.shift_remove(&selected);
        if let Some(cr) = removed {
            for (var, _) in cr.row.iter() {
                if let Some(set) = self.column_index.get_mut(&var) {
                    set.shift_remove(&selected);
                }
            }
        }
        Some(selected)
    }

    /// `eliminate(variable, row_id)`: Gaussian-eliminates `variable` out of
    /// every other combination row that still carries it, so it appears only
    /// in `row_id` afterward (spec.md §4.1). Returns the `(row, scalar)`
    /// pairs applied, in the same row-combination form `addCombToCombVector`
    /// uses, so the caller can replay the identical scalars against the
    /// inner-product tracker ("Also update the inner-product tracker
    /// (row-combine rule)").
    pub fn eliminate(&mut self, variable: VarId, row_id: RowId) -> Vec<(RowId, f64)> {
        let pivot_coeff = self.combinations[&row_id].row.coefficient(variable);
        debug_assert!(pivot_coeff != 0.0, "eliminate called with zero pivot coefficient");

        let others: Vec<(RowId, f64)> = self
            .column_index
            .get(&variable)
            .map(|rows| {
                rows.iter()
                    .copied()
                    .filter(|&r| r != row_id)
                    .map(|r| (r, self.combinations[&r].row.coefficient(variable)))
                    .collect()
            })
            .unwrap_or_default();

        let mut applied = Vec::with_capacity(others.len());
        for (other_row, other_coeff) in others {
            if other_coeff == 0.0 {
                continue;
            }
            let scalar = -other_coeff / pivot_coeff;
            self.add_comb_to_comb_vector(other_row, row_id, scalar);
            applied.push((other_row, scalar));
        }
        applied
    }

    /// `r(dst) += scalar * r(src)`.
    pub fn add_comb_to_comb_vector(&mut self, dst: RowId, src: RowId, scalar: f64) {
        if scalar == 0.0 {
            return;
        }
        let src_combo = self.combinations[&src].combo.clone();
        let src_row = self.combinations[&src].row.clone();
        let old_dst_row = self.combinations[&dst].row.clone();

        let dst_cr = self.combinations.get_mut(&dst).unwrap();
        dst_cr.combo.add_scaled(&src_combo, scalar);
        dst_cr.row.add_scaled(&src_row, scalar);
        let new_dst_row = dst_cr.row.clone();

        self.reindex(dst, Some(&old_dst_row), &new_dst_row);
    }

    pub fn get_value(&self, row_id: RowId, var: VarId) -> f64 {
        self.combinations
            .get(&row_id)
            .map(|cr| cr.row.coefficient(var))
            .unwrap_or(0.0)
    }

    pub fn combination_component_index(&self, var: VarId) -> impl Iterator<Item = RowId> + '_ {
        self.column_index
            .get(&var)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of combination rows in which `var` has a nonzero coefficient —
    /// used by the bound-variable selection tie-break (spec.md §4.4).
    pub fn occurrence_count(&self, var: VarId) -> usize {
        self.column_index.get(&var).map(IndexSet::len).unwrap_or(0)
    }

    pub fn row(&self, row_id: RowId) -> Option<&Row> {
        self.combinations.get(&row_id).map(|cr| &cr.row)
    }

    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.combinations.keys().copied()
    }

    pub fn base_row(&self, row_id: RowId) -> Option<&Row> {
        self.base.get(row_id)
    }

    /// Scales a combination row by `c` (`normalize`). The caller decides when
    /// the scale-threshold is crossed (spec.md §4.1).
    pub fn normalize(&mut self, row_id: RowId, c: f64) {
        if let Some(cr) = self.combinations.get_mut(&row_id) {
            cr.row.scale(c);
            cr.combo.scale(c);
        }
    }

    /// Numerical hygiene: rebuilds every combination row from the base set
    /// and its recorded coefficients, replacing rows whose drift from the
    /// freshly reconstructed value exceeds `tolerance`.
    pub fn repair_combinations(&mut self, tolerance: f64) -> Vec<RowId> {
        let ids: Vec<RowId> = self.combinations.keys().copied().collect();
        let mut repaired = Vec::new();
        for row_id in ids {
            let combo = self.combinations[&row_id].combo.clone();
            let mut rebuilt = Row::new();
            for (base_id, coeff) in combo.iter() {
                if let Some(base_row) = self.base.get(base_id) {
                    rebuilt.add_scaled(base_row, coeff);
                }
            }
            let drift = max_entry_drift(&self.combinations[&row_id].row, &rebuilt);
            if drift > tolerance {
                let old = self.combinations[&row_id].row.clone();
                self.reindex(row_id, Some(&old), &rebuilt);
                self.combinations.get_mut(&row_id).unwrap().row = rebuilt;
                repaired.push(row_id);
            }
        }
        repaired
    }
}

fn max_entry_drift(a: &Row, b: &Row) -> f64 {
    let mut drift: f64 = 0.0;
    for (var, coeff) in a.iter() {
        drift = drift.max((coeff - b.coefficient(var)).abs());
    }
    for (var, coeff) in b.iter() {
        drift = drift.max((coeff - a.coefficient(var)).abs());
    }
    drift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: u32) -> VarId {
        VarId(i)
    }

    #[test]
    fn new_vector_round_trips_value() {
        let mut cv = CombinationVectors::new();
        let row = Row::from_entries([(v(0), 1.0), (v(1), -1.0)]);
        let id = cv.new_vector(row);
        assert_eq!(cv.get_value(id, v(0)), 1.0);
        assert_eq!(cv.get_value(id, v(1)), -1.0);
    }

    #[test]
    fn eliminate_removes_variable_from_other_rows() {
        let mut cv = CombinationVectors::new();
        let r0 = cv.new_vector(Row::from_entries([(v(0), 1.0), (v(1), -1.0)]));
        let r1 = cv.new_vector(Row::from_entries([(v(1), 1.0), (v(2), 1.0)]));
        // r1 has v1 with coeff 1; eliminate v1 using r0 (coeff -1 there).
        let applied = cv.eliminate(v(1), r0);
        assert_eq!(applied, vec![(r1, 1.0)]);
        assert_eq!(cv.get_value(r1, v(1)), 0.0);
        // r1 should have picked up v0's contribution: r1 += 1.0 * r0
        assert_eq!(cv.get_value(r1, v(0)), 1.0);
        assert_eq!(cv.get_value(r1, v(2)), 1.0);
    }

    #[test]
    fn remove_vector_preserves_other_rows_span() {
        let mut cv = CombinationVectors::new();
        let r0 = cv.new_vector(Row::from_entries([(v(0), 1.0), (v(1), 1.0)]));
        let r1 = cv.new_vector(Row::from_entries([(v(0), 1.0), (v(2), 1.0)]));
        cv.add_comb_to_comb_vector(r1, r0, 1.0); // r1 now references base r0 too
        let dropped = cv.remove_vector(r0);
        assert!(dropped.is_some());
        assert!(cv.base_row(r0).is_none());
    }

    #[test]
    fn repair_combinations_reconstructs_drifted_row() {
        let mut cv = CombinationVectors::new();
        let r0 = cv.new_vector(Row::from_entries([(v(0), 1.0)]));
        // Introduce drift directly into the expanded row without updating combo.
        cv.combinations.get_mut(&r0).unwrap().row = Row::from_entries([(v(0), 1.5)]);
        let repaired = cv.repair_combinations(1e-9);
        assert_eq!(repaired, vec![r0]);
        assert_eq!(cv.get_value(r0, v(0)), 1.0);
    }
}
