use std::fmt;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur in the keyword classifier.
#[derive(Debug)]
pub enum ClassifierError {
    /// Error occurred while fitting or applying the vectorizer
    VectorizerError(String),
    /// Error occurred while loading, saving or validating the model artifact
    ModelError(String),
    /// Error occurred while fitting the network
    TrainingError(String),
    /// Error occurred while making predictions
    PredictionError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VectorizerError(msg) => write!(f, "Vectorizer error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::TrainingError(msg) => write!(f, "Training error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<ModelError> for ClassifierError {
    fn from(err: ModelError) -> Self {
        ClassifierError::ModelError(err.to_string())
    }
}
