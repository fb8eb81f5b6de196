//! A bounded variable tied to a free one by an equation whose solution would
//! push it past its own segment: it gets pinned at its boundary instead, and
//! the leftover error surfaces as a suspended violation in the solve report.

use pos_equations::{
    Direction, MovementAllowance, OrGroups, PosCalcContext, PosEquations, SegmentConstraints,
    SolverConfig, VarId,
};
use std::collections::{HashMap, HashSet};

/// A single `[min, max]` segment per variable plus a preferred ("stay")
/// value; resistance is `+inf` only when the segment is pinned to a single
/// point, matching a hard positioning constraint rather than a soft one.
struct BoundedSegments {
    min: HashMap<VarId, f64>,
    max: HashMap<VarId, f64>,
    preference: HashMap<VarId, f64>,
    changes: HashSet<VarId>,
}

impl SegmentConstraints for BoundedSegments {
    fn preferred_value(&self, var: VarId, last_value: Option<f64>) -> f64 {
        last_value.unwrap_or_else(|| self.preference.get(&var).copied().unwrap_or(0.0))
    }

    fn next_value(&self, var: VarId, _from_value: f64, upward: bool) -> f64 {
        if upward {
            self.max.get(&var).copied().unwrap_or(f64::INFINITY)
        } else {
            self.min.get(&var).copied().unwrap_or(f64::NEG_INFINITY)
        }
    }

    fn allows_movement(&self, var: VarId, dir: Direction, target: f64) -> MovementAllowance {
        let boundary = self.next_value(var, 0.0, dir == Direction::Up);
        let within = match dir {
            Direction::Up => target <= boundary,
            Direction::Down => target >= boundary,
        };
        if within { MovementAllowance::Allowed } else { MovementAllowance::Denied }
    }

    fn in_range(&self, var: VarId, value: f64) -> bool {
        let min = self.min.get(&var).copied().unwrap_or(f64::NEG_INFINITY);
        let max = self.max.get(&var).copied().unwrap_or(f64::INFINITY);
        value >= min && value <= max
    }

    fn variable_has_or_groups(&self, _var: VarId) -> bool {
        false
    }

    fn resistance(&self, var: VarId, _dir: Direction) -> f64 {
        let min = self.min.get(&var).copied();
        let max = self.max.get(&var).copied();
        if min.is_some() && min == max { f64::INFINITY } else { f64::NEG_INFINITY }
    }

    fn set_stable_value(&mut self, var: VarId, value: f64) {
        self.preference.insert(var, value);
    }

    fn changes(&self) -> &HashSet<VarId> {
        &self.changes
    }
}

#[derive(Default)]
struct NoOrGroups;

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
struct Ctx;

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

fn main() {
    let mut engine = PosEquations::new(SolverConfig::default());
    // a - b = -10, i.e. a must sit ten below b.
    engine.add_equation(&[("a", 1.0), ("b", -1.0), ("gap", 10.0)]);
    // "gap" is pinned at 1 so the row reads `a - b + 10 = 0`.
    let gap = engine.variable_id("gap").unwrap();

    let a = engine.variable_id("a").unwrap();
    let b = engine.variable_id("b").unwrap();
    let mut segments = BoundedSegments {
        min: HashMap::from([(a, 0.0), (gap, 1.0)]),
        max: HashMap::from([(a, 5.0), (gap, 1.0)]),
        preference: HashMap::from([(a, 0.0), (b, 20.0), (gap, 1.0)]),
        changes: HashSet::new(),
    };
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    let report = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("bounded example stays within the step watchdogs");

    let solution = engine.get_solution();
    println!("a = {} (segment [0, 5])", solution["a"]);
    println!("b = {}", solution["b"]);
    println!("suspended violations: {}", report.remaining_violations.len());
    assert!(solution["a"] >= 0.0 && solution["a"] <= 5.0);
}
