//! Per-variable resistance bookkeeping (spec.md §3 "Resistance").

use crate::trace::Direction;

/// `res(v, up)`, `res(v, down)`, and the extra resistance contributed by
/// or-groups `v` currently satisfies together with another variable.
///
/// The satisfied-or-group contribution is interface-level in spec.md §4.3
/// (`getSatOrGroupResistance`/`getResistanceWithSatOrGroups` are exposed per
/// direction, but §3's Data Model only names a single "contribution of
/// satisfied or-groups" per variable) — here it is tracked per direction
/// too, populated identically in both directions from the same satisfied
/// groups, since a satisfied or-group is broken by moving away from the
/// value that satisfies it regardless of which way the move goes. See
/// DESIGN.md for this resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResistanceEntry {
    pub own: [f64; 2],
    pub sat_or_group: [f64; 2],
}

impl Default for ResistanceEntry {
    fn default() -> Self {
        ResistanceEntry {
            own: [f64::NEG_INFINITY, f64::NEG_INFINITY],
            sat_or_group: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }
}

fn slot(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
    }
}

impl ResistanceEntry {
    pub fn own_in(&self, dir: Direction) -> f64 {
        self.own[slot(dir)]
    }

    pub fn sat_in(&self, dir: Direction) -> f64 {
        self.sat_or_group[slot(dir)]
    }

    pub fn with_sat_or_group_in(&self, dir: Direction) -> f64 {
        self.own_in(dir).max(self.sat_in(dir))
    }

    pub fn min_own(&self) -> f64 {
        self.own[0].min(self.own[1])
    }

    pub fn set_own(&mut self, dir: Direction, value: f64) {
        self.own[slot(dir)] = value;
    }

    pub fn set_sat(&mut self, dir: Direction, value: f64) {
        self.sat_or_group[slot(dir)] = value;
    }
}
