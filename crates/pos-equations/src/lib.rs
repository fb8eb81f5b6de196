//! Incremental linear-equation pivot solver for layout positioning.
//!
//! [`PosEquations`] holds a set of linear equations over named variables
//! (`addEquation`/`setEquation`/`removeEquation`) plus, through the
//! [`collaborators`] traits, segment (min/max) constraints, a stability
//! preference, and boolean or-group constraints supplied by the caller.
//! [`PosEquations::prepare_and_solve`] runs one full solve pass: it
//! reconciles structural edits, drives the system to zero equation error,
//! then optimizes toward each out-of-segment variable's preferred value in
//! priority order, and finally commits the result as the next pass's
//! stability reference.
//!
//! ```
//! use pos_equations::{PosEquations, SolverConfig};
//!
//! let mut engine = PosEquations::new(SolverConfig::default());
//! let row = engine.add_equation(&[("a", 1.0), ("b", -1.0)]);
//! assert!(engine.has_variable("a"));
//! drop(row);
//! ```

mod bound_free;
mod collaborators;
mod combination_vectors;
mod config;
mod equation;
mod error;
mod ids;
mod inner_products;
mod numeric;
mod pos_equations;
mod resistance;
mod suspension;
mod trace;
mod variables_by_resistance;
mod violations;

pub use collaborators::{MovementAllowance, OrGroups, PosCalcContext, SegmentConstraints};
pub use config::SolverConfig;
pub use error::{SolveError, SolveResult};
pub use ids::{RowId, VarId};
pub use pos_equations::{PosEquations, SolveReport};
pub use resistance::TotalResistance;
pub use trace::{Direction, NullObserver, SolverObserver};
pub use violations::Violation;
