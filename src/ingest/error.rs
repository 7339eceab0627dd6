use thiserror::Error;

/// Reasons an export document is rejected before anything is stored.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("No JSON data provided")]
    NoData,
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Main \"data\" object is missing or empty")]
    MissingData,
    #[error("Unexpected export structure: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Cardio Log ID is missing")]
    MissingCardioLogId,
    #[error("Invalid date format: {0}. Expected DD/MM/YYYY")]
    InvalidDate(String),
}
