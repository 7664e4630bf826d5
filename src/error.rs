//! Run-terminating errors.
//!
//! Every variant is fatal for the run and maps to a stable process exit code.
//! Row-level problems (bad dates, non-numeric values, duplicate dates) never
//! surface here; they are counted and reported by the stage that hit them.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::InputKind;

#[derive(Debug, Error)]
pub enum AppError {
    /// An input could not be used at all: no readable partition file for a
    /// metric, or a consolidated table that cannot be opened or lacks columns.
    #[error("SourceUnavailable: no usable {input} at '{}' ({skipped} skipped)", root.display())]
    SourceUnavailable {
        input: InputKind,
        root: PathBuf,
        skipped: usize,
    },

    /// PR and GHI share no dates, so the merge produced zero rows.
    #[error("EmptyIntersection: PR ({pr_dates} dates) and GHI ({ghi_dates} dates) have no date in common")]
    EmptyIntersection { pr_dates: usize, ghi_dates: usize },

    #[error("InvalidRange: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("WriteFailure: cannot write '{}': {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input that cannot be used to configure a run (bad layout, bad values).
    #[error("{0}")]
    Config(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::SourceUnavailable { .. } | AppError::InvalidRange { .. } | AppError::Config(_) => 2,
            AppError::EmptyIntersection { .. } => 3,
            AppError::WriteFailure { .. } => 4,
        }
    }
}
