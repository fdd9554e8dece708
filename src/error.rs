use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures from table loading and result export.
///
/// The calculation itself has no error path; unknown labels fall back to
/// default values instead of failing.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tables file is not valid JSON or does not match the expected shape.
    #[error("Failed to parse tables: {0}")]
    TableParse(#[from] serde_json::Error),

    /// The tables parsed but break a structural rule (empty table, bad range).
    #[error("Invalid table '{table}': {reason}")]
    InvalidTable { table: &'static str, reason: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(table: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            table,
            reason: reason.into(),
        }
    }
}
