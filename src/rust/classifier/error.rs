use ort::Error as OrtError;

use crate::artifact::ArtifactError;

/// Represents the different types of errors that can occur while classifying ads.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// A slug outside the fixed taxonomy was requested
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    /// The model artifact is missing, corrupt or does not match the taxonomy
    #[error("Model load error: {0}")]
    ModelLoadError(String),
    /// Error occurred while loading or using the tokenizer
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
    /// Error occurred while running inference
    #[error("Prediction error: {0}")]
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelLoadError(err.to_string())
    }
}

impl From<ArtifactError> for ClassifierError {
    fn from(err: ArtifactError) -> Self {
        ClassifierError::ModelLoadError(err.to_string())
    }
}
