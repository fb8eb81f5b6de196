//! Post phase: `setResistanceForNextRound` (spec.md §4.8). Runs after
//! feasibility and optimization have settled the solution for this pass,
//! committing it as the stability reference the next `prepare_and_solve`
//! call will measure resistance against.

use super::PosEquations;
use crate::collaborators::SegmentConstraints;
use crate::trace::SolverObserver;

pub(super) fn set_resistance_for_next_round<O: SolverObserver>(
    engine: &mut PosEquations<O>,
    segments: &mut impl SegmentConstraints,
) {
    let changed: Vec<_> = engine.solution_changes.iter().copied().collect();
    for var in changed {
        let value = engine.solution_value(var);
        engine.resistance.set_stable_value(var, value, segments);
    }

    engine.resistance.clear_all_total_resistance();
}
