//! Interfaces the engine consumes but does not implement (spec.md §6
//! "Required collaborator interfaces"). `PosCalc`, the segment-constraint
//! store and the or-group store are the caller's responsibility; the engine
//! only needs a read-reference to each, stable across one solve (spec.md §5
//! "Shared resources").

use crate::ids::VarId;
use crate::trace::Direction;
use std::collections::HashSet;

/// Result of asking whether a variable may move in a direction past a
/// target: either it may, it may not, or it may only because of a set of
/// or-groups it would stop (or start) satisfying.
#[derive(Debug, Clone, PartialEq)]
pub enum MovementAllowance {
    Allowed,
    Denied,
    ResistedByOrGroups(HashSet<u32>),
}

/// Per-variable segment (min/max) constraints, stability preference, and the
/// priority at which each bound holds (spec.md §6).
pub trait SegmentConstraints {
    /// The value this variable should take absent any other influence —
    /// typically the previous stable value, else a domain default.
    fn preferred_value(&self, var: VarId, last_value: Option<f64>) -> f64;

    /// The next segment boundary strictly beyond `from_value` in the given
    /// direction, or `+inf`/`-inf` if unbounded in that direction.
    fn next_value(&self, var: VarId, from_value: f64, upward: bool) -> f64;

    /// Whether `var` may move in `dir` as far as `target`.
    fn allows_movement(&self, var: VarId, dir: Direction, target: f64) -> MovementAllowance;

    /// Whether `value` lies within `var`'s current segment (spec.md §4.4
    /// step 2: "keep previous value if it lies in \[min,max\]").
    fn in_range(&self, var: VarId, value: f64) -> bool;

    /// Whether `var` participates in any or-group at all — used to decide
    /// whether satisfied-or-group resistance bookkeeping is worth computing.
    fn variable_has_or_groups(&self, var: VarId) -> bool;

    /// The own resistance of `var` in `dir`: the lowest priority at which a
    /// forced move in that direction is infeasible, folding together both
    /// the segment (min/max) boundary and the stability ("stay") preference
    /// at `var`'s current value — `-inf` if nothing resists, `+inf` if the
    /// segment is pinned (`min == max`).
    fn resistance(&self, var: VarId, dir: Direction) -> f64;

    /// Records `value` as the stability ("stay") reference for `var` going
    /// into the next solve pass (spec.md §4.8 `setResistanceForNextRound`).
    fn set_stable_value(&mut self, var: VarId, value: f64);

    /// Variables whose segment constraints changed since the caller last
    /// cleared this set (spec.md §4.4 step 2: "For each variable whose
    /// segment constraints or linear-induced segment changed, re-evaluate").
    fn changes(&self) -> &HashSet<VarId>;
}

/// Boolean OR-group constraints: a group is satisfied when at least two of
/// its member variables currently hold compatible values.
pub trait OrGroups {
    fn is_satisfied_on_other_variable(&self, group: u32, var: VarId) -> bool;
    fn satisfied_variables(&self, group: u32) -> Vec<VarId>;
    fn group_status(&self, group: u32) -> bool;
    fn update_variable_satisfaction(&mut self, var: VarId, value: f64, stable: bool);
    fn or_groups_of(&self, var: VarId) -> Vec<u32>;
    /// Priority at which `group` resists being un-satisfied.
    fn group_priority(&self, group: u32) -> f64;
}

/// The positioning orchestrator that owns variable membership and the
/// previous-round solution used as the stability reference.
pub trait PosCalcContext {
    fn last_value(&self, var: VarId) -> Option<f64>;
    fn has_variable(&self, var: VarId) -> bool;
    fn zero_rounding(&self) -> f64;
}
