use thiserror::Error;

pub type Result<T> = std::result::Result<T, CfError>;

/// Failures surfaced by the model. All of them are local to one call and
/// recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CfError {
    /// No subject has rated the target, so there is no basis for a prediction.
    #[error("target {target} has no raters")]
    EmptyRaterSet { target: u32 },

    #[error("model has not been fitted; call fit() before querying")]
    UninitializedModel,

    /// Rejected at ingestion. `index` is the position in the input sequence.
    #[error("malformed rating at index {index}: {reason}")]
    MalformedInput { index: usize, reason: String },

    #[error("subject {subject} is outside the fitted id range (0..{subject_count})")]
    UnknownSubject { subject: u32, subject_count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A similarity function was handed, or returned, matrices of the wrong shape.
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}
