//! Two variables tied by an equality equation, each preferring a different
//! value: since neither offers any resistance, `prepare_and_solve` picks one
//! of them as the row's bound variable and pulls it fully onto the other's
//! value rather than averaging the two.

use pos_equations::{
    Direction, MovementAllowance, OrGroups, PosCalcContext, PosEquations, SegmentConstraints,
    SolverConfig, VarId,
};
use std::collections::{HashMap, HashSet};

/// Every variable is free to take any value; `preferred_value` is the only
/// thing pulling it anywhere, and it offers no resistance to being pulled
/// away from that preference afterward.
struct OpenSegments {
    preference: HashMap<VarId, f64>,
    changes: HashSet<VarId>,
}

impl SegmentConstraints for OpenSegments {
    fn preferred_value(&self, var: VarId, last_value: Option<f64>) -> f64 {
        last_value.unwrap_or_else(|| self.preference.get(&var).copied().unwrap_or(0.0))
    }

    fn next_value(&self, _var: VarId, _from_value: f64, upward: bool) -> f64 {
        if upward { f64::INFINITY } else { f64::NEG_INFINITY }
    }

    fn allows_movement(&self, _var: VarId, _dir: Direction, _target: f64) -> MovementAllowance {
        MovementAllowance::Allowed
    }

    fn in_range(&self, _var: VarId, _value: f64) -> bool {
        true
    }

    fn variable_has_or_groups(&self, _var: VarId) -> bool {
        false
    }

    fn resistance(&self, _var: VarId, _dir: Direction) -> f64 {
        f64::NEG_INFINITY
    }

    fn set_stable_value(&mut self, _var: VarId, _value: f64) {}

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
    // a - b = 0: a and b are forced to take the same value.
    engine.add_equation(&[("a", 1.0), ("b", -1.0)]);

    let a = engine.variable_id("a").unwrap();
    let b = engine.variable_id("b").unwrap();
    let mut segments = OpenSegments {
        preference: HashMap::from([(a, 10.0), (b, 0.0)]),
        changes: HashSet::new(),
    };
    let mut or_groups = NoOrGroups;
    let mut ctx = Ctx;

    let report = engine
        .prepare_and_solve(&mut ctx, &mut segments, &mut or_groups)
        .expect("two free variables never hit an internal step cap");

    let solution = engine.get_solution();
    println!("a = {}", solution["a"]);
    println!("b = {}", solution["b"]);
    assert_eq!(solution["a"], solution["b"]);
    println!("solution changes this pass: {}", report.solution_changes.len());
}
