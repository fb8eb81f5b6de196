//! Priority-sorted violation list (spec.md §3 "Violations").

use crate::ids::VarId;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub variable: VarId,
    pub target: f64,
    pub priority: f64,
    pub suspended: bool,
}

/// Keyed by `(priority, variable)` so `Violations::most_severe` pops the
/// highest-priority entry in `O(log n)`, matching the optimization phase's
/// "Iterates violations in decreasing priority" (spec.md §4.7). Plain
/// `BTreeMap` rather than a dependency on the sorted-list primitive spec.md
/// §1 names as an external collaborator — that primitive is out of scope,
/// and a balanced tree keyed on the same ordering is a faithful stand-in.
#[derive(Default)]
pub struct Violations {
    by_priority: BTreeMap<(OrderedFloat<f64>, VarId), Violation>,
    by_variable: std::collections::HashMap<VarId, (OrderedFloat<f64>, VarId)>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, variable: VarId, target: f64, priority: f64) {
        self.remove(variable);
        let key = (OrderedFloat(priority), variable);
        self.by_priority.insert(
            key,
            Violation { variable, target, priority, suspended: false },
        );
        self.by_variable.insert(variable, key);
    }

    pub fn remove(&mut self, variable: VarId) {
        if let Some(key) = self.by_variable.remove(&variable) {
            self.by_priority.remove(&key);
        }
    }

    pub fn get(&self, variable: VarId) -> Option<&Violation> {
        self.by_variable.get(&variable).and_then(|k| self.by_priority.get(k))
    }

    pub fn suspend(&mut self, variable: VarId) {
        if let Some(key) = self.by_variable.get(&variable) {
            if let Some(v) = self.by_priority.get_mut(key) {
                v.suspended = true;
            }
        }
    }

    pub fn unsuspend(&mut self, variable: VarId) {
        if let Some(key) = self.by_variable.get(&variable) {
            if let Some(v) = self.by_priority.get_mut(key) {
                v.suspended = false;
            }
        }
    }

    /// Highest-priority non-suspended entry, i.e. the next one the
    /// optimization phase should attempt (spec.md §4.7).
    pub fn most_severe_active(&self) -> Option<&Violation> {
        self.by_priority
            .values()
            .rev()
            .find(|v| !v.suspended)
    }

    pub fn iter_by_priority_desc(&self) -> impl Iterator<Item = &Violation> {
        self.by_priority.values().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.by_priority.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_priority.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_severe_skips_suspended() {
        let mut v = Violations::new();
        v.set(VarId(0), 10.0, 5.0);
        v.set(VarId(1), 10.0, 9.0);
        v.suspend(VarId(1));
        assert_eq!(v.most_severe_active().unwrap().variable, VarId(0));
    }

    #[test]
    fn set_replaces_existing_entry() {
        let mut v = Violations::new();
        v.set(VarId(0), 5.0, 1.0);
        v.set(VarId(0), 7.0, 3.0);
        assert_eq!(v.len(), 1);
        assert_eq!(v.get(VarId(0)).unwrap().priority, 3.0);
    }
}
