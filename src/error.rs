use thiserror::Error;

use crate::types::VariantKind;

/// A problem instance that violates the entity invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInstance {
    #[error("instance has no bars")]
    NoBars,
    #[error("instance has no orders")]
    NoOrders,
    #[error("bar {index} has non-positive length")]
    NonPositiveBar { index: usize },
    #[error("order {index} has non-positive length")]
    NonPositiveOrder { index: usize },
}

/// Raised while building a variant's model, before anything reaches the solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulationError {
    #[error("big-M {big_m} does not dominate the instance (needs at least {required})")]
    BigMTooSmall { big_m: f64, required: f64 },
    #[error("parameter `{name}` has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("{variant} reads `{group}` variables that were never created")]
    MissingVariables {
        variant: VariantKind,
        group: &'static str,
    },
}

/// Failure inside the external solving engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("solver backend failed: {0}")]
    Backend(String),
    #[error("solution has {got} values for a model with {expected} variables")]
    ValueCount { expected: usize, got: usize },
}

/// Everything that can stop one variant from producing an outcome.
#[derive(Debug, Error)]
pub enum VariantError {
    #[error(transparent)]
    Instance(#[from] InvalidInstance),
    #[error(transparent)]
    Formulation(#[from] FormulationError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("variant panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("empty range for `{name}`: [{min}, {max})")]
    EmptyRange {
        name: &'static str,
        min: u32,
        max: u32,
    },
    #[error("target run count must be at least 1")]
    NoRuns,
    #[error("generator reuse threshold {generator} differs from {variant} threshold {params}")]
    ThresholdMismatch {
        variant: VariantKind,
        generator: u32,
        params: f64,
    },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
