use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Engine error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the engine can surface to a caller.
///
/// `EmptyAfterClipping` and `DegenerateStatistics` are produced by the
/// statistics layer; the summary extractor recovers from both by writing a
/// sentinel for the row, single-object queries return them as-is. No
/// non-finite number is ever handed to a caller; `NonFinite` replaces it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad bin size, unknown column, malformed coordinate axis, ...
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An index (rank or physical row) outside the addressable range.
    #[error("{what} {index} out of range (0..{len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("series is empty after sigma clipping")]
    EmptyAfterClipping,

    #[error("degenerate statistics: median {median} is not positive")]
    DegenerateStatistics { median: f64 },

    /// A result overflowed or became NaN although every input was finite.
    #[error("{what} is not finite")]
    NonFinite { what: &'static str },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported or unreadable file format: {0}")]
    Format(String),

    /// The column store failed while reading; never retried.
    #[error(transparent)]
    SourceRead(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub(crate) fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        EngineError::OutOfRange { what, index, len }
    }

    /// `Ok(value)` when finite, `NonFinite` otherwise.
    pub(crate) fn check_finite(what: &'static str, value: f64) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EngineError::NonFinite { what })
        }
    }

    pub(crate) fn unknown_column(column: &str) -> Self {
        EngineError::InvalidParameter(format!("unknown column '{column}'"))
    }
}
