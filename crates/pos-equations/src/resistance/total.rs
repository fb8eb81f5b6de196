//! Cached result of the total-resistance search (spec.md §3, §4.3
//! `getTotalResistance`). The search itself walks the equation system (rows,
//! bound variables, zero-error status) and is therefore carried out by the
//! pivot engine (`pos_equations::resistance_reduction`); this module only
//! defines the cached shape and the per-variable cache the engine populates.

use crate::ids::VarId;
use crate::trace::Direction;
use indexmap::IndexMap;

/// `{resistance, resistingVar, resistingOrGroup}` — the own-or-induced
/// resistance in a chosen direction, and, if the binding resistance came
/// from a bound variable of a zero-error row rather than from `v` itself,
/// which variable (and, if that variable's resistance was itself amplified
/// by a satisfied or-group, which group).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalResistance {
    pub resistance: f64,
    pub resisting_var: Option<VarId>,
    pub resisting_or_group: Option<u32>,
}

impl TotalResistance {
    pub fn own(resistance: f64) -> Self {
        TotalResistance { resistance, resisting_var: None, resisting_or_group: None }
    }
}

#[derive(Default)]
pub struct TotalResistanceCache {
    up: IndexMap<VarId, TotalResistance>,
    down: IndexMap<VarId, TotalResistance>,
}

impl TotalResistanceCache {
    pub fn get(&self, var: VarId, dir: Direction) -> Option<TotalResistance> {
        self.table(dir).get(&var).copied()
    }

    pub fn set(&mut self, var: VarId, dir: Direction, value: TotalResistance) {
        self.table_mut(dir).insert(var, value);
    }

    pub fn clear_var(&mut self, var: VarId) {
        self.up.shift_remove(&var);
        self.down.shift_remove(&var);
    }

    /// Clears all cached totals — `setResistanceForNextRound` (spec.md §4.8)
    /// does this for every variable at the end of a solve pass.
    pub fn clear_all(&mut self) {
        self.up.clear();
        self.down.clear();
    }

    fn table(&self, dir: Direction) -> &IndexMap<VarId, TotalResistance> {
        match dir {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    fn table_mut(&mut self, dir: Direction) -> &mut IndexMap<VarId, TotalResistance> {
        match dir {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }
}
