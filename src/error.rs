//! Error types shared by the loading, analysis and reporting stages.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("city '{city}' has no valid rows after filtering")]
    EmptyDataset { city: String },

    #[error("cannot compute shares of an empty sequence")]
    EmptyInput,

    #[error("concentration is not a number: {0}")]
    InvalidInput(f64),

    #[error("{}: row {row}, column '{column}': '{value}' is not a number", .path.display())]
    MalformedInput {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{}: required column '{column}' not found in header", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
