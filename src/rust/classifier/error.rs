use thiserror::Error;

/// Represents the different types of errors that can occur while building or
/// running the product classifier.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    /// Error occurred due to invalid input parameters or records
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Error occurred during the fit phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred while making predictions
    #[error("Prediction error: {0}")]
    PredictionError(String),
}
