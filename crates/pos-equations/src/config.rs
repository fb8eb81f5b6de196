//! Tuning parameters (spec.md §6 "Tuning parameters").

/// Knobs governing numerical tolerance and the watchdog step caps. Construct
/// with [`SolverConfig::default`] and override individual fields; there is no
/// config-file support because nothing in this family of crates reads
/// configuration from disk — tuning is always a constructor argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Ratio below which a value, or a ratio of a delta to a reference
    /// magnitude, is flushed to exactly zero.
    pub zero_rounding: f64,
    /// Integer-coefficient norm a combination row can reach before
    /// `normalize` rescales it back toward unit scale.
    pub normalization_threshold: f64,
    /// Watchdog on the feasibility loop (`findFeasibleSolution`).
    pub max_reduction_step_num: u32,
    /// Watchdog on the optimization loop, counted across both
    /// optimization attempts and internal error-reduction steps.
    pub max_optimization_steps: u32,
    /// Per-(free, bound) pair cap on exchanges within one
    /// `reduceResistance` cycle, bounding the anti-cycling trace.
    pub max_repeat_exchanges: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            zero_rounding: 1e-9,
            normalization_threshold: 1000.0,
            max_reduction_step_num: 5000,
            max_optimization_steps: 5000,
            max_repeat_exchanges: 10,
        }
    }
}
