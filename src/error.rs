use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the I/O collaborators around the triage engine.
///
/// The engine itself is total over its inputs; these only surface when a
/// file that was supplied cannot be read or written.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("FASTA parse error in {path}: {message}")]
    Fasta { path: PathBuf, message: String },
    #[error("delimited table error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TriageError>;
