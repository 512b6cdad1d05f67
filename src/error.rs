use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `SimError` and maps other errors to it.
///
/// Every variant except `SimError` is fatal for a run: configuration that does
/// not describe a usable model, or an object pool that was sized too small.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    DateError(chrono::ParseError),
    /// An object pool ran out of slots. The pool was sized from the
    /// expected peak population and that estimate was exceeded.
    PoolExhausted {
        pool: &'static str,
        capacity: usize,
    },
    /// A genotype sequence does not match the gene metadata.
    InvalidGenotype {
        sequence: String,
        reason: String,
    },
    InvalidParameters(String),
    SimError(String),
}

impl SimError {
    pub(crate) fn invalid_genotype(sequence: &str, reason: impl Into<String>) -> Self {
        SimError::InvalidGenotype {
            sequence: sequence.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::IoError(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::JsonError(error)
    }
}

impl From<csv::Error> for SimError {
    fn from(error: csv::Error) -> Self {
        SimError::CsvError(error)
    }
}

impl From<chrono::ParseError> for SimError {
    fn from(error: chrono::ParseError) -> Self {
        SimError::DateError(error)
    }
}

impl From<String> for SimError {
    fn from(error: String) -> Self {
        SimError::SimError(error)
    }
}

impl From<&str> for SimError {
    fn from(error: &str) -> Self {
        SimError::SimError(error.to_string())
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::IoError(error) => Some(error),
            SimError::JsonError(error) => Some(error),
            SimError::CsvError(error) => Some(error),
            SimError::DateError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::PoolExhausted { pool, capacity } => write!(
                f,
                "Error: object pool `{pool}` exhausted (capacity {capacity})"
            ),
            SimError::InvalidGenotype { sequence, reason } => {
                write!(f, "Error: invalid genotype `{sequence}`: {reason}")
            }
            SimError::InvalidParameters(message) => {
                write!(f, "Error: invalid parameters: {message}")
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
