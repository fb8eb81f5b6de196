//! Bound/free partition bookkeeping (spec.md §3 "Bound/free partition").
//! The selection rule itself (`findBoundVarCandidate`, spec.md §4.4) lives
//! in [`crate::pos_equations::prepare`] since it needs to query
//! `CombinationVectors` and `Resistance`; this module only owns the two
//! inverse maps and the refresh queue.

use crate::ids::{RowId, VarId};
use indexmap::{IndexMap, IndexSet};

#[derive(Default)]
pub struct BoundFree {
    bound_of_var: IndexMap<VarId, RowId>,
    var_of_row: IndexMap<RowId, VarId>,
    /// Rows whose bound variable needs (re)selection, or whose current
    /// bound variable no longer appears exclusively in its own row
    /// (`needToRefreshBoundVar`).
    need_refresh: IndexSet<RowId>,
}

impl BoundFree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self, var: VarId) -> bool {
        self.bound_of_var.contains_key(&var)
    }

    pub fn is_free(&self, var: VarId) -> bool {
        !self.is_bound(var)
    }

    pub fn bound_row_of(&self, var: VarId) -> Option<RowId> {
        self.bound_of_var.get(&var).copied()
    }

    pub fn bound_var_of_row(&self, row: RowId) -> Option<VarId> {
        self.var_of_row.get(&row).copied()
    }

    pub fn row_has_bound_var(&self, row: RowId) -> bool {
        self.var_of_row.contains_key(&row)
    }

    /// Assigns `var` as the bound variable of `row`, clearing any previous
    /// assignment for either side.
    pub fn set_bound(&mut self, row: RowId, var: VarId) {
        if let Some(prev_var) = self.var_of_row.get(&row).copied() {
            self.bound_of_var.shift_remove(&prev_var);
        }
        if let Some(prev_row) = self.bound_of_var.get(&var).copied() {
            self.var_of_row.shift_remove(&prev_row);
        }
        self.bound_of_var.insert(var, row);
        self.var_of_row.insert(row, var);
    }

    /// Frees `row`'s bound variable, if any, and returns it.
    pub fn free_row(&mut self, row: RowId) -> Option<VarId> {
        let var = self.var_of_row.shift_remove(&row)?;
        self.bound_of_var.shift_remove(&var);
        Some(var)
    }

    pub fn free_variable(&mut self, var: VarId) -> Option<RowId> {
        let row = self.bound_of_var.shift_remove(&var)?;
        self.var_of_row.shift_remove(&row);
        Some(row)
    }

    pub fn queue_refresh(&mut self, row: RowId) {
        self.need_refresh.insert(row);
    }

    pub fn clear_refresh(&mut self, row: RowId) {
        self.need_refresh.shift_remove(&row);
    }

    pub fn pending_refresh(&self) -> impl Iterator<Item = RowId> + '_ {
        self.need_refresh.iter().copied()
    }

    pub fn has_pending_refresh(&self) -> bool {
        !self.need_refresh.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowId> + '_ {
        self.var_of_row.keys().copied()
    }
}
