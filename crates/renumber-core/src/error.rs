use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("phone number has no digits: {0}")]
    EmptyNumber(String),
    #[error("mapping column name cannot be empty")]
    EmptyColumnName,
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to open mapping file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mapping file is missing required column {0:?}")]
    MissingColumn(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
