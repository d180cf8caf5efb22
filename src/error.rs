//! Error taxonomy shared by every stage of the pipeline.
//!
//! Shape and data-format errors abort the enclosing trial. Numeric edge cases
//! (too few episodes, unusable importance weights) are raised here instead of
//! being allowed to leak NaN/Inf into the optimizer.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Parameter vector length does not match the policy's declared shape.
    #[error("parameter vector has length {got}, expected {expected}")]
    Shape { expected: usize, got: usize },

    /// State vector length does not match the policy / feature map input.
    #[error("state vector has dimension {got}, expected {expected}")]
    StateDimension { expected: usize, got: usize },

    /// Tabular state index outside the table.
    #[error("state index {index} is outside the table of {num_states} states")]
    StateOutOfRange { index: f64, num_states: usize },

    #[error("action {action} is outside the action space of size {num_actions}")]
    ActionOutOfRange { action: usize, num_actions: usize },

    /// Too few samples for a standard deviation or a t quantile.
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// An importance weight could not be formed (zero or non-finite
    /// behavior probability, or an overflowing weighted return).
    #[error("degenerate importance weight in episode {episode}, step {step}: {detail}")]
    DegenerateWeight {
        episode: usize,
        step: usize,
        detail: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A history or vector that does not follow the expected layout.
    #[error("malformed data: {0}")]
    Malformed(String),

    /// Dataset file format error (1-based line number).
    #[error("parse error on line {line}: {detail}")]
    Parse { line: usize, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error stems from the data rather than from the caller's
    /// configuration or the filesystem.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData { .. }
                | Error::DegenerateWeight { .. }
                | Error::Malformed(_)
                | Error::Parse { .. }
                | Error::StateOutOfRange { .. }
                | Error::ActionOutOfRange { .. }
        )
    }
}
