use thiserror::Error;

use crate::history::HistoryKind;

/// Every failure the kernel can report. All of them are raised at the point
/// of misuse; nothing inside the kernel retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KinematicsError {
    #[error("shape mismatch: expected {expected}, got {found}")]
    Shape { expected: String, found: String },

    #[error("history variable `{0}` is already registered")]
    DuplicateName(String),

    #[error("history variable `{0}` is not registered")]
    UnknownName(String),

    #[error("history variable `{name}` is registered as {actual}, not {requested}")]
    TypeMismatch {
        name: String,
        requested: HistoryKind,
        actual: HistoryKind,
    },

    #[error("arguments do not match the last decoupled state")]
    StaleCache,

    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    #[error("invalid slip system: {0}")]
    InvalidSlipSystem(String),
}

impl KinematicsError {
    pub(crate) fn shape(expected: impl ToString, found: impl ToString) -> Self {
        Self::Shape {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KinematicsError>;
