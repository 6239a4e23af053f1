//! Transport-neutral request handling.
//!
//! [`ClassificationService`] owns the active predictor and answers the
//! classifier's endpoints. An HTTP server (or any other transport) only has to
//! forward method, path and body to [`ClassificationService::handle`] and write
//! back the returned status and JSON.

use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};

use crate::classifier::{
    AdInput, ClassifierError, HeuristicPredictor, ModelInfo, ModelPredictor, PredictionResult, Predictor,
};
use crate::config::{PredictorKind, ServiceConfig};
use crate::taxonomy::{list_categories, Category};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Model not loaded. Please train the model first.")]
    ModelUnavailable,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },
    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ModelUnavailable => 503,
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::Classification(ClassifierError::ValidationError(_)) => 400,
            Self::Classification(_) | Self::Internal(_) => 500,
        }
    }
}

/// Body of `GET /health` and `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model_loaded: bool,
}

/// Body of `GET /categories`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoriesResponse {
    pub categories: &'static [Category],
}

/// Status code and JSON body produced by [`ClassificationService::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: Value,
}

impl ServiceResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(&ServiceError::Internal(e.to_string())),
        }
    }

    fn error(err: &ServiceError) -> Self {
        Self {
            status: err.status_code(),
            body: json!({ "detail": err.to_string() }),
        }
    }
}

/// The serving boundary around the active predictor.
///
/// Holds at most one predictor behind `Arc<dyn Predictor>`; requests never
/// branch on which concrete predictor that is.
pub struct ClassificationService {
    predictor: Option<Arc<dyn Predictor>>,
    kind: PredictorKind,
    model_loaded: bool,
    model_info: Option<ModelInfo>,
}

impl ClassificationService {
    /// Wires a service around an already constructed predictor.
    pub fn new(predictor: Option<Arc<dyn Predictor>>, kind: PredictorKind, model_loaded: bool) -> Self {
        Self {
            predictor,
            kind,
            model_loaded,
            model_info: None,
        }
    }

    /// Keyword heuristic only. Reports `model_loaded: true` since nothing is missing.
    pub fn heuristic() -> Self {
        Self::new(Some(Arc::new(HeuristicPredictor::new())), PredictorKind::Heuristic, true)
    }

    pub fn with_model(model: ModelPredictor) -> Self {
        let model_info = model.info();
        Self {
            model_info: Some(model_info),
            ..Self::new(Some(Arc::new(model)), PredictorKind::Model, true)
        }
    }

    /// Builds the service at startup.
    ///
    /// A model that fails to load never aborts startup: the failure is logged
    /// and shows up as `model_loaded: false`. In `auto` mode the heuristic then
    /// serves requests; in `model` mode predictions fail with 503.
    pub fn from_config(config: &ServiceConfig) -> Self {
        if config.predictor == PredictorKind::Heuristic {
            info!("Serving with the keyword heuristic");
            return Self::heuristic();
        }

        let loaded = ModelPredictor::builder()
            .with_runtime_config(config.runtime.clone())
            .with_max_sequence_length(config.max_sequence_length)
            .and_then(|builder| builder.with_batch_size(config.batch_size))
            .and_then(|builder| builder.with_artifact(&config.artifact()))
            .and_then(|builder| builder.build());

        match loaded {
            Ok(model) => {
                info!("Model loaded from {:?}", config.model_dir);
                Self {
                    kind: config.predictor,
                    ..Self::with_model(model)
                }
            }
            Err(e) => {
                error!("Error loading model from {:?}: {}", config.model_dir, e);
                match config.predictor {
                    PredictorKind::Auto => {
                        warn!("Falling back to the keyword heuristic");
                        Self::new(Some(Arc::new(HeuristicPredictor::new())), PredictorKind::Auto, false)
                    }
                    _ => {
                        warn!("Prediction requests will fail until a model is available");
                        Self::new(None, config.predictor, false)
                    }
                }
            }
        }
    }

    pub fn kind(&self) -> PredictorKind {
        self.kind
    }

    /// Name of the predictor answering requests, if any.
    pub fn predictor_name(&self) -> Option<&'static str> {
        self.predictor.as_ref().map(|p| p.name())
    }

    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: if self.predictor.is_some() { "healthy" } else { "online" },
            model_loaded: self.model_loaded,
        }
    }

    pub fn categories(&self) -> CategoriesResponse {
        CategoriesResponse {
            categories: list_categories(),
        }
    }

    fn active_predictor(&self) -> Result<&Arc<dyn Predictor>, ServiceError> {
        self.predictor.as_ref().ok_or(ServiceError::ModelUnavailable)
    }

    pub fn predict_category(&self, ad: &AdInput) -> Result<PredictionResult, ServiceError> {
        Ok(self.active_predictor()?.predict(ad)?)
    }

    pub fn predict_batch(&self, ads: &[AdInput]) -> Result<Vec<PredictionResult>, ServiceError> {
        Ok(self.active_predictor()?.predict_batch(ads)?)
    }

    /// Runs inference on the blocking pool so a slow forward pass does not
    /// stall the async runtime.
    async fn run_blocking<T, F>(&self, task: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Predictor) -> Result<T, ClassifierError> + Send + 'static,
    {
        let predictor = Arc::clone(self.active_predictor()?);
        let outcome = tokio::task::spawn_blocking(move || task(predictor.as_ref()))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        Ok(outcome?)
    }

    pub async fn predict_category_async(&self, ad: AdInput) -> Result<PredictionResult, ServiceError> {
        self.run_blocking(move |predictor| predictor.predict(&ad)).await
    }

    pub async fn predict_batch_async(&self, ads: Vec<AdInput>) -> Result<Vec<PredictionResult>, ServiceError> {
        self.run_blocking(move |predictor| predictor.predict_batch(&ads)).await
    }

    /// Answers one request.
    ///
    /// | method | path                | body            | response              |
    /// |--------|---------------------|-----------------|-----------------------|
    /// | GET    | `/`, `/health`      |                 | [`HealthStatus`]      |
    /// | GET    | `/categories`       |                 | [`CategoriesResponse`]|
    /// | POST   | `/predict-category` | [`AdInput`]     | [`PredictionResult`]  |
    /// | POST   | `/predict-batch`    | `[AdInput]`     | `[PredictionResult]`  |
    ///
    /// Errors come back as `{"detail": "..."}` with the status from
    /// [`ServiceError::status_code`].
    pub async fn handle(&self, method: &str, path: &str, body: &[u8]) -> ServiceResponse {
        let path = path.split('?').next().unwrap_or(path);
        let response = match self.route(method, path, body).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed: {}", method, path, e);
                ServiceResponse::error(&e)
            }
        };
        info!("{} {} -> {}", method, path, response.status);
        response
    }

    async fn route(&self, method: &str, path: &str, body: &[u8]) -> Result<ServiceResponse, ServiceError> {
        match (method, path) {
            ("GET", "/") | ("GET", "/health") => Ok(ServiceResponse::ok(&self.health())),
            ("GET", "/categories") => Ok(ServiceResponse::ok(&self.categories())),
            ("POST", "/predict-category") => {
                let ad: AdInput = parse_body(body)?;
                let result = self.predict_category_async(ad).await?;
                Ok(ServiceResponse::ok(&result))
            }
            ("POST", "/predict-batch") => {
                let ads: Vec<AdInput> = parse_body(body)?;
                let results = self.predict_batch_async(ads).await?;
                Ok(ServiceResponse::ok(&results))
            }
            (_, "/" | "/health" | "/categories" | "/predict-category" | "/predict-batch") => {
                Err(ServiceError::MethodNotAllowed {
                    method: method.to_string(),
                    path: path.to_string(),
                })
            }
            _ => Err(ServiceError::NotFound(path.to_string())),
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body).map_err(|e| ServiceError::InvalidRequest(e.to_string()))
}
