use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    Parse {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("dataset contains no records")]
    EmptyDataset,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0} not fitted. Call fit() first.")]
    NotFitted(&'static str),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}
