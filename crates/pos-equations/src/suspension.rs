//! Optimization suspension bookkeeping: `blocked`, `selfBlocked`, and
//! `equations` (spec.md §3 "Optimization suspension", §4.7). These three
//! maps cross-reference each other under one invariant —
//! `w ∈ equations[r].blocking ⟺ r ∈ blocked[w].blockedEq` — which every
//! mutator here preserves instead of leaving to callers (REDESIGN FLAGS:
//! "represent as three disjoint maps whose cross-references are modified
//! only through a small set of helper operations that preserve the
//! invariant").

use crate::ids::{RowId, VarId};
use crate::trace::Direction;
use indexmap::{IndexMap, IndexSet};

/// A free variable that cannot be moved by any lower-priority combination of
/// moves in `resistance_dir`, because doing so would push `blocking`'s bound
/// variable further into violation.
#[derive(Debug, Clone)]
pub struct Blocked {
    pub priority: f64,
    pub blocking: RowId,
    pub relative_sign: f64,
    pub resistance_dir: Direction,
    /// Rows this variable, by being blocked, in turn blocks.
    pub blocked_eq: IndexSet<RowId>,
}

/// A free variable that resists at `>= priority` in both directions on its
/// own — it is never worth considering for the derivative vector of any row
/// it appears in at that priority.
#[derive(Debug, Clone)]
pub struct SelfBlocked {
    pub resistance: f64,
    pub blocked_rows: IndexSet<RowId>,
}

/// A row currently suspending its bound variable's optimization.
#[derive(Debug, Clone)]
pub struct BlockingEquation {
    pub suspension_id: u64,
    pub optimization_priority: f64,
    pub optimization_dir: Direction,
    pub bound_var: VarId,
    pub blocked: IndexSet<VarId>,
    pub blocking: IndexSet<VarId>,
    pub self_blocked: IndexSet<VarId>,
}

#[derive(Default)]
pub struct SuspensionState {
    blocked: IndexMap<VarId, Blocked>,
    self_blocked: IndexMap<VarId, SelfBlocked>,
    equations: IndexMap<RowId, BlockingEquation>,
    next_suspension_id: u64,
}

impl SuspensionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self, var: VarId) -> bool {
        self.blocked.contains_key(&var)
    }

    pub fn is_self_blocked(&self, var: VarId) -> bool {
        self.self_blocked.contains_key(&var)
    }

    pub fn blocked(&self, var: VarId) -> Option<&Blocked> {
        self.blocked.get(&var)
    }

    pub fn self_blocked(&self, var: VarId) -> Option<&SelfBlocked> {
        self.self_blocked.get(&var)
    }

    pub fn equation(&self, row: RowId) -> Option<&BlockingEquation> {
        self.equations.get(&row)
    }

    pub fn blocked_variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.blocked.keys().copied()
    }

    pub fn self_blocked_variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.self_blocked.keys().copied()
    }

    pub fn equation_mut(&mut self, row: RowId) -> Option<&mut BlockingEquation> {
        self.equations.get_mut(&row)
    }

    /// Creates (or refreshes) `equations[row]` with a fresh monotonically
    /// increasing suspension id, as required the first time a row becomes
    /// blocking (spec.md §4.7 `suspendOptimizationByBlocked`, §3 "Suspension
    /// ID").
    pub fn open_blocking_equation(
        &mut self,
        row: RowId,
        bound_var: VarId,
        priority: f64,
        dir: Direction,
    ) -> u64 {
        if let Some(existing) = self.equations.get_mut(&row) {
            existing.optimization_priority = priority;
            existing.optimization_dir = dir;
            existing.bound_var = bound_var;
            return existing.suspension_id;
        }
        let id = self.next_suspension_id;
        self.next_suspension_id += 1;
        self.equations.insert(
            row,
            BlockingEquation {
                suspension_id: id,
                optimization_priority: priority,
                optimization_dir: dir,
                bound_var,
                blocked: IndexSet::new(),
                blocking: IndexSet::new(),
                self_blocked: IndexSet::new(),
            },
        );
        id
    }

    /// A row may only be blocked by another row of strictly higher priority,
    /// or equal priority and strictly lower suspension id (spec.md §4.7:
    /// "this acyclic order is essential for termination").
    pub fn may_block(&self, candidate: RowId, by: RowId) -> bool {
        let (Some(c), Some(b)) = (self.equations.get(&candidate), self.equations.get(&by)) else {
            return true;
        };
        b.optimization_priority > c.optimization_priority
            || (b.optimization_priority == c.optimization_priority
                && b.suspension_id < c.suspension_id)
    }

    /// Marks `var` as blocked by `row`, preserving the
    /// `blocking ⟺ blockedEq` invariant. If `var` was already blocked by a
    /// *later* suspension id, its `blockedEq` set simply grows; it is not
    /// moved.
    pub fn mark_blocked(
        &mut self,
        var: VarId,
        row: RowId,
        priority: f64,
        relative_sign: f64,
        resistance_dir: Direction,
    ) {
        self.self_blocked.shift_remove(&var);
        let entry = self.blocked.entry(var).or_insert_with(|| Blocked {
            priority,
            blocking: row,
            relative_sign,
            resistance_dir,
            blocked_eq: IndexSet::new(),
        });
        entry.blocked_eq.insert(row);
        if let Some(eq) = self.equations.get_mut(&row) {
            eq.blocked.insert(var);
        }
    }

    /// Registers `var` as already blocked elsewhere, now also blocking
    /// `row` (spec.md §4.7 "it enters `equations[r].blocking` and
    /// `blocked[w].blockedEq` gains r").
    pub fn mark_blocking(&mut self, var: VarId, row: RowId) {
        if let Some(entry) = self.blocked.get_mut(&var) {
            entry.blocked_eq.insert(row);
        }
        if let Some(eq) = self.equations.get_mut(&row) {
            eq.blocking.insert(var);
        }
    }

    pub fn mark_self_blocked(&mut self, var: VarId, row: RowId, resistance: f64) {
        let entry = self.self_blocked.entry(var).or_insert_with(|| SelfBlocked {
            resistance,
            blocked_rows: IndexSet::new(),
        });
        entry.resistance = resistance;
        entry.blocked_rows.insert(row);
        if let Some(eq) = self.equations.get_mut(&row) {
            eq.self_blocked.insert(var);
        }
    }

    /// Unblocks `var` entirely: removes it from every row it was listed as
    /// blocking, preserving the invariant on both sides, and returns the
    /// rows that no longer have *any* blocker and so may themselves unblock
    /// recursively (spec.md §4.7 "Blocking-graph updates").
    pub fn unblock_variable(&mut self, var: VarId) -> Vec<RowId> {
        let Some(entry) = self.blocked.shift_remove(&var) else {
            return Vec::new();
        };
        let mut newly_free_rows = Vec::new();
        for row in entry.blocked_eq {
            if let Some(eq) = self.equations.get_mut(&row) {
                eq.blocking.shift_remove(&var);
                if eq.blocking.is_empty() && eq.blocked.is_empty() {
                    newly_free_rows.push(row);
                }
            }
        }
        newly_free_rows
    }

    pub fn unblock_self(&mut self, var: VarId) -> Vec<RowId> {
        let Some(entry) = self.self_blocked.shift_remove(&var) else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for row in entry.blocked_rows {
            if let Some(eq) = self.equations.get_mut(&row) {
                eq.self_blocked.shift_remove(&var);
                rows.push(row);
            }
        }
        rows
    }

    /// Closes a blocking row entirely (its bound variable stopped violating,
    /// or the row's structure changed) — every variable it was blocking is
    /// freed from this row, recursively unblocked if this was their only
    /// blocker.
    pub fn close_blocking_equation(&mut self, row: RowId) -> Vec<VarId> {
        let Some(eq) = self.equations.shift_remove(&row) else {
            return Vec::new();
        };
        let mut freed = Vec::new();
        for var in eq.blocked.iter().chain(eq.blocking.iter()) {
            if let Some(entry) = self.blocked.get_mut(var) {
                entry.blocked_eq.shift_remove(&row);
                if entry.blocked_eq.is_empty() {
                    freed.push(*var);
                }
            }
        }
        for var in &freed {
            self.blocked.shift_remove(var);
        }
        for var in eq.self_blocked.iter() {
            if let Some(entry) = self.self_blocked.get_mut(var) {
                entry.blocked_rows.shift_remove(&row);
            }
        }
        freed
    }

    pub fn remove_variable(&mut self, var: VarId) {
        self.unblock_variable(var);
        self.unblock_self(var);
    }

    /// Checks the class invariant — used by tests and debug assertions.
    pub fn check_invariant(&self) -> bool {
        for (&row, eq) in self.equations.iter() {
            for &var in eq.blocking.iter() {
                match self.blocked.get(&var) {
                    Some(b) if b.blocked_eq.contains(&row) => {}
                    _ => return false,
                }
            }
        }
        for (&var, blocked) in self.blocked.iter() {
            for &row in blocked.blocked_eq.iter() {
                let Some(eq) = self.equations.get(&row) else { return false };
                if !(eq.blocking.contains(&var) || eq.blocked.contains(&var)) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_blocked_then_blocking_preserves_invariant() {
        let mut s = SuspensionState::new();
        s.open_blocking_equation(RowId(0), VarId(9), 5.0, Direction::Up);
        s.mark_blocked(VarId(1), RowId(0), 5.0, 1.0, Direction::Up);
        assert!(s.check_invariant());

        s.open_blocking_equation(RowId(1), VarId(8), 3.0, Direction::Down);
        s.mark_blocking(VarId(1), RowId(1));
        assert!(s.check_invariant());
        assert!(s.equation(RowId(1)).unwrap().blocking.contains(&VarId(1)));
    }

    #[test]
    fn unblock_variable_clears_both_sides() {
        let mut s = SuspensionState::new();
        s.open_blocking_equation(RowId(0), VarId(9), 5.0, Direction::Up);
        s.mark_blocked(VarId(1), RowId(0), 5.0, 1.0, Direction::Up);
        s.unblock_variable(VarId(1));
        assert!(!s.is_blocked(VarId(1)));
        assert!(!s.equation(RowId(0)).unwrap().blocked.contains(&VarId(1)));
        assert!(s.check_invariant());
    }

    #[test]
    fn may_block_respects_priority_then_suspension_id() {
        let mut s = SuspensionState::new();
        let a = RowId(0);
        let b = RowId(1);
        s.open_blocking_equation(a, VarId(0), 5.0, Direction::Up);
        s.open_blocking_equation(b, VarId(1), 5.0, Direction::Up);
        // Equal priority: the earlier-created (lower suspension id) row may block the later one.
        assert!(s.may_block(b, a));
        assert!(!s.may_block(a, b));
    }
}
