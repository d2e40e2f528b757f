// Solver error types

/// Errors raised by the solver.
///
/// Construction and parameter replacement fail with one of the configuration
/// variants. [`SimError::NonFinite`] is only ever reported, never raised by
/// the core; the caller decides whether to halt or reset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("grid size must be at least 2, got {0}")]
    InvalidGridSize(usize),

    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("grid size cannot change on a live simulation ({current} -> {requested})")]
    GridSizeChange { current: usize, requested: usize },

    #[error("field `{field}` became non-finite at step {step}")]
    NonFinite { field: &'static str, step: u64 },
}
