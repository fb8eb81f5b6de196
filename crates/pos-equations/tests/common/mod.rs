//! Shared collaborator stand-ins for the integration tests: a configurable
//! per-variable segment store, a no-op or-group store, and a context whose
//! `last_value` is wired to whatever the previous pass actually produced.

#![allow(dead_code)]

use pos_equations::{Direction, MovementAllowance, OrGroups, PosCalcContext, SegmentConstraints, VarId};
use std::collections::{HashMap, HashSet};

/// A `[min, max]` segment, a preferred ("stay") value and an explicit own
/// resistance per variable. A pinned segment (`min == max`) always reports
/// infinite resistance in both directions, overriding whatever resistance
/// was set explicitly, matching the boundary law that a pinned segment is a
/// hard constraint regardless of priority.
#[derive(Default)]
pub struct Segments {
    pub min: HashMap<VarId, f64>,
    pub max: HashMap<VarId, f64>,
    pub preferred: HashMap<VarId, f64>,
    pub resistance: HashMap<VarId, f64>,
    pub changes: HashSet<VarId>,
}

impl Segments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, var: VarId, min: f64, max: f64) -> Self {
        self.min.insert(var, min);
        self.max.insert(var, max);
        self
    }

    pub fn with_preferred(mut self, var: VarId, value: f64) -> Self {
        self.preferred.insert(var, value);
        self
    }

    pub fn with_resistance(mut self, var: VarId, value: f64) -> Self {
        self.resistance.insert(var, value);
        self
    }

    fn min_of(&self, var: VarId) -> f64 {
        self.min.get(&var).copied().unwrap_or(f64::NEG_INFINITY)
    }

    fn max_of(&self, var: VarId) -> f64 {
        self.max.get(&var).copied().unwrap_or(f64::INFINITY)
    }
}

impl SegmentConstraints for Segments {
    fn preferred_value(&self, var: VarId, last_value: Option<f64>) -> f64 {
        let base = last_value.unwrap_or_else(|| self.preferred.get(&var).copied().unwrap_or(0.0));
        base.clamp(self.min_of(var), self.max_of(var))
    }

    fn next_value(&self, var: VarId, _from_value: f64, upward: bool) -> f64 {
        if upward { self.max_of(var) } else { self.min_of(var) }
    }

    fn allows_movement(&self, var: VarId, dir: Direction, target: f64) -> MovementAllowance {
        let within = match dir {
            Direction::Up => target <= self.max_of(var),
            Direction::Down => target >= self.min_of(var),
        };
        if within { MovementAllowance::Allowed } else { MovementAllowance::Denied }
    }

    fn in_range(&self, var: VarId, value: f64) -> bool {
        value >= self.min_of(var) && value <= self.max_of(var)
    }

    fn variable_has_or_groups(&self, _var: VarId) -> bool {
        false
    }

    fn resistance(&self, var: VarId, _dir: Direction) -> f64 {
        if self.min_of(var) == self.max_of(var) {
            return f64::INFINITY;
        }
        self.resistance.get(&var).copied().unwrap_or(f64::NEG_INFINITY)
    }

    fn set_stable_value(&mut self, var: VarId, value: f64) {
        self.preferred.insert(var, value);
    }

    fn changes(&self) -> &HashSet<VarId> {
        &self.changes
    }
}

#[derive(Default)]
pub struct NoOrGroups;

impl OrGroups for NoOrGroups {
    fn is_satisfied_on_other_variable(&self, _group: u32, _var: VarId) -> bool {
        false
    }
    fn satisfied_variables(&self, _group: u32) -> Vec<VarId> {
        Vec::new()
    }
    fn group_status(&self, _group: u32) -> bool {
        false
    }
    fn update_variable_satisfaction(&mut self, _var: VarId, _value: f64, _stable: bool) {}
    fn or_groups_of(&self, _var: VarId) -> Vec<u32> {
        Vec::new()
    }
    fn group_priority(&self, _group: u32) -> f64 {
        f64::NEG_INFINITY
    }
}

#[derive(Default)]
pub struct Ctx;

impl PosCalcContext for Ctx {
    fn last_value(&self, _var: VarId) -> Option<f64> {
        None
    }
    fn has_variable(&self, _var: VarId) -> bool {
        true
    }
    fn zero_rounding(&self) -> f64 {
        1e-9
    }
}
