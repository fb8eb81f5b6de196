//! Opaque observer hook for debugging/visualization tooling built on top of
//! the engine (REDESIGN FLAGS: "Global-ish debug tracing/counters... inject
//! as an opaque observer trait; production builds elide calls").
//!
//! `PosEquations` is generic over `O: SolverObserver`; [`NullObserver`]'s
//! methods are all empty and inline away entirely, so production call sites
//! (`PosEquations<f64>`, i.e. `O = NullObserver`) pay nothing. A test or a
//! debugging UI can instead plug in a recording observer to assert on pivot
//! sequences without threading extra bookkeeping through the engine itself.

use crate::ids::{RowId, VarId};

/// Direction of travel used throughout the engine's movement bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn from_sign(sign: f64) -> Option<Direction> {
        if sign > 0.0 {
            Some(Direction::Up)
        } else if sign < 0.0 {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

#[allow(unused_variables)]
pub trait SolverObserver {
    fn on_phase_start(&mut self, phase: &'static str) {}
    fn on_phase_end(&mut self, phase: &'static str) {}
    /// A variable was exchanged with `bound` in `row` during resistance
    /// reduction or the feasibility pivot.
    fn on_pivot(&mut self, free: VarId, bound: VarId, row: RowId) {}
    fn on_bound_assigned(&mut self, var: VarId, row: RowId) {}
    fn on_suspend(&mut self, var: VarId, priority: f64) {}
    fn on_anti_cycle_detected(&mut self, free: VarId, bound: VarId) {}
}

/// Default observer used by `PosEquations::new`; all methods are no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SolverObserver for NullObserver {}
