mod error;
mod encoding;
mod model;
mod prediction;
mod predictor;
pub mod builder;
pub mod heuristic;
mod utils;

pub use error::ClassifierError;
pub use model::ModelPredictor;
pub use prediction::{AdInput, CategoryScores, PredictionResult};
pub use predictor::Predictor;
pub use builder::ModelPredictorBuilder;
pub use heuristic::{suggest_categories, HeuristicPredictor};

/// Information about a loaded model
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModelInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Number of labels the model scores
    pub num_labels: usize,
    /// Tokens kept per ad before truncation
    pub max_sequence_length: usize,
    /// Ads per forward pass in batch prediction
    pub batch_size: usize,
}
