//! Typed internal-error surface (spec.md §7(1)).
//!
//! These are programmer errors: step caps exceeded, an unbounded move
//! surfacing where the algorithm's invariants guarantee boundedness, or a
//! blocked variable found below the priority it was declared blocked at.
//! None of these should occur for a correctly configured caller; they are
//! returned rather than panicked so the caller decides whether to treat them
//! as fatal (REDESIGN FLAGS: "typed result carrying a reason code").
//!
//! Well-formed-but-unsatisfiable input (spec.md §7(2)) is *not* represented
//! here — it shows up as a suspended [`crate::violations::Violation`] in the
//! solve report, not as an `Err`.

use crate::ids::{RowId, VarId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SolveError {
    #[error(
        "feasibility loop exceeded {limit} steps without reaching zero error \
         (row {row:?} still has nonzero error) — likely a solver bug, not a caller input problem"
    )]
    ReductionStepLimitExceeded { limit: u32, row: RowId },

    #[error(
        "optimization loop exceeded {limit} steps while driving {var:?} toward its target"
    )]
    OptimizationStepLimitExceeded { limit: u32, var: VarId },

    #[error(
        "unbounded move computed for {var:?} during feasibility error reduction: \
         no row or segment boundary bounds the step"
    )]
    UnboundedFeasibilityMove { var: VarId },

    #[error(
        "unbounded move computed for {var:?} during bounded optimization toward a finite target"
    )]
    UnboundedOptimizationMove { var: VarId },

    #[error(
        "variable {var:?} is recorded as blocked at priority {blocked_priority} but the \
         current optimization priority {priority} is not lower"
    )]
    BlockedPriorityInversion {
        var: VarId,
        blocked_priority: f64,
        priority: f64,
    },
}

pub type SolveResult<T> = Result<T, SolveError>;
