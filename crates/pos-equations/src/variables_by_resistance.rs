//! Pair-sorted pivot-candidate list (spec.md §3 "Variables-by-resistance
//! list"). Keyed by `(ownResistance, totalResistance)` in each variable's
//! current error-reducing direction; the **last** entry is always the next
//! pivot candidate for `reduceResistance`/`reduceError`.

use crate::ids::VarId;
use crate::trace::Direction;
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, HashMap, HashSet};

type Key = (OrderedFloat<f64>, OrderedFloat<f64>, VarId);

#[derive(Debug, Clone, Copy)]
pub struct CandidateEntry {
    pub variable: VarId,
    pub direction: Direction,
    pub own_resistance: f64,
    pub total_resistance: f64,
    pub resisting_var: Option<VarId>,
    pub resisting_or_group: Option<u32>,
}

#[derive(Default)]
pub struct VariablesByResistance {
    entries: BTreeMap<Key, CandidateEntry>,
    index: HashMap<VarId, Key>,
    /// Entries repositioned to their satisfied-or-group-augmented key by
    /// `reduceResistanceWithSatisfiedOrGroupVariable` (spec.md §4.6).
    sat_or_group_variables: HashSet<VarId>,
}

impl VariablesByResistance {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_of(entry: &CandidateEntry) -> Key {
        (
            OrderedFloat(entry.own_resistance),
            OrderedFloat(entry.total_resistance),
            entry.variable,
        )
    }

    pub fn remove(&mut self, var: VarId) {
        if let Some(key) = self.index.remove(&var) {
            self.entries.remove(&key);
        }
        self.sat_or_group_variables.remove(&var);
    }

    pub fn upsert(&mut self, entry: CandidateEntry) {
        self.remove(entry.variable);
        let key = Self::key_of(&entry);
        self.index.insert(entry.variable, key);
        self.entries.insert(key, entry);
    }

    pub fn get(&self, var: VarId) -> Option<&CandidateEntry> {
        self.index.get(&var).and_then(|k| self.entries.get(k))
    }

    /// The current pivot candidate: the entry with the largest
    /// `(own, total)` key.
    pub fn last(&self) -> Option<&CandidateEntry> {
        self.entries.values().next_back()
    }

    /// The entry just behind the pivot candidate, used by
    /// `reduceResistanceWithSatisfiedOrGroupVariable`'s upper bound `U`
    /// (spec.md §4.6).
    pub fn second_last(&self) -> Option<&CandidateEntry> {
        self.entries.values().rev().nth(1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Repositions `var` to key `(sat, sat)`, i.e. treats the
    /// satisfied-or-group resistance as both its own and total resistance
    /// for pivot-ordering purposes, and marks it in `satOrGroupVariables`.
    pub fn reposition_to_sat_or_group(&mut self, var: VarId, sat_resistance: f64) {
        if let Some(mut entry) = self.get(var).copied() {
            entry.own_resistance = sat_resistance;
            entry.total_resistance = sat_resistance;
            self.upsert(entry);
            self.sat_or_group_variables.insert(var);
        }
    }

    pub fn is_sat_or_group_repositioned(&self, var: VarId) -> bool {
        self.sat_or_group_variables.contains(&var)
    }

    pub fn clear_sat_or_group_marker(&mut self, var: VarId) {
        self.sat_or_group_variables.remove(&var);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.sat_or_group_variables.clear();
    }

    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.index.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(var: u32, own: f64, total: f64) -> CandidateEntry {
        CandidateEntry {
            variable: VarId(var),
            direction: Direction::Up,
            own_resistance: own,
            total_resistance: total,
            resisting_var: None,
            resisting_or_group: None,
        }
    }

    #[test]
    fn last_is_the_largest_pair() {
        let mut list = VariablesByResistance::new();
        list.upsert(entry(0, 1.0, 1.0));
        list.upsert(entry(1, 2.0, 0.0));
        list.upsert(entry(2, 2.0, 5.0));
        assert_eq!(list.last().unwrap().variable, VarId(2));
    }

    #[test]
    fn reposition_changes_ordering() {
        let mut list = VariablesByResistance::new();
        list.upsert(entry(0, 1.0, 1.0));
        list.upsert(entry(1, 5.0, 5.0));
        list.reposition_to_sat_or_group(VarId(0), 9.0);
        assert_eq!(list.last().unwrap().variable, VarId(0));
        assert!(list.is_sat_or_group_repositioned(VarId(0)));
    }
}
