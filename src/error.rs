//! Error types for dataset loading and aggregation.
//!
//! An empty summary window is not an error; see [`crate::aggregate::RangeSummary::NoData`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    /// Row count or column layout the engine cannot display.
    #[error("cannot display this dataset: {0}")]
    MalformedInput(String),

    /// Series of mismatched length or time base were combined.
    #[error("series are not aligned: {0}")]
    Alignment(String),

    #[error("no column for subject {0}")]
    UnknownSubject(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        DataError::MalformedInput(reason.into())
    }

    pub fn alignment(reason: impl Into<String>) -> Self {
        DataError::Alignment(reason.into())
    }
}
