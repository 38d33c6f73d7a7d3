//! Errors in the library.
use thiserror::Error;

/// Errors raised by environments, solvers and the session harness.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaxiError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A start state or probe was outside the world or already solved.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// A world description could not be turned into a grid.
    #[error("Invalid world: {0}")]
    InvalidWorld(String),

    /// A configuration value was out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A learned model contradicts an observed transition.
    #[error("Model inconsistency: {0}")]
    ModelInconsistency(String),

    /// Value iteration did not settle within its iteration cap.
    #[error("Value iteration did not converge after {iterations} iterations (residual {residual})")]
    ConvergenceFailure {
        /// Number of sweeps performed.
        iterations: usize,
        /// Largest value change in the last sweep.
        residual: f64,
    },
}
