//! Classifies real-estate listing ads (title + description) into one of nine fixed categories.
//!
//! Two predictors share one contract, [`Predictor`], and one response shape,
//! [`PredictionResult`]:
//! - [`HeuristicPredictor`] matches Persian keywords and needs no model
//! - [`ModelPredictor`] runs a fine-tuned transformer exported to ONNX
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ad_classifier::{AdInput, CategoryId, HeuristicPredictor, Predictor};
//!
//! let predictor = HeuristicPredictor::new();
//! let result = predictor.predict(&AdInput::new("اجاره مغازه در مرکز شهر", "مغازه 50 متری"))?;
//!
//! assert_eq!(result.category, CategoryId::ShopRent);
//! println!("{} ({:.2})", result.category_name, result.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Model-backed prediction
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ad_classifier::{AdInput, ModelArtifact, ModelPredictor, Predictor};
//!
//! let predictor = ModelPredictor::load(&ModelArtifact::new("./ad_classifier"))?;
//! let results = predictor.predict_batch(&[
//!     AdInput::new("فروش آپارتمان 2 خوابه", "آپارتمان 80 متری در ونک"),
//!     AdInput::new("اجاره دفتر اداری", "دفتر 100 متری در مرکز شهر"),
//! ])?;
//! for result in results {
//!     println!("{}: {:.2}", result.category, result.confidence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! [`ClassificationService`] wraps whichever predictor is configured and
//! answers `/health`, `/categories` and `/predict-category` requests for any
//! transport layer.

pub mod artifact;
pub mod classifier;
pub mod config;
mod runtime;
pub mod service;
pub mod taxonomy;

pub use artifact::{ArtifactError, ModelArtifact};
pub use classifier::{
    suggest_categories, AdInput, CategoryScores, ClassifierError, HeuristicPredictor, ModelInfo, ModelPredictor,
    ModelPredictorBuilder, PredictionResult, Predictor,
};
pub use config::{ConfigError, PredictorKind, ServiceConfig};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use service::{CategoriesResponse, ClassificationService, HealthStatus, ServiceError, ServiceResponse};
pub use taxonomy::{display_name_of, list_categories, Category, CategoryId, CATEGORY_COUNT};

pub fn init_logger() {
    env_logger::init();
}
