//! Error types for the analytics engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("No samples available for field '{field}'")]
    NoSamples { field: &'static str },

    #[error("Unknown sequence id: {0}")]
    SequenceNotFound(String),

    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Duration field parse error: {0}")]
    Duration(#[from] std::num::ParseFloatError),
}
