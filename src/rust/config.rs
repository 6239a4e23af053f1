use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::artifact::{ModelArtifact, MODEL_DIR_ENV};
use crate::classifier::builder::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_SEQUENCE_LENGTH};
use crate::runtime::RuntimeConfig;

pub const PREDICTOR_ENV: &str = "AD_CLASSIFIER_PREDICTOR";
pub const BATCH_SIZE_ENV: &str = "AD_CLASSIFIER_BATCH_SIZE";
pub const MAX_SEQUENCE_LENGTH_ENV: &str = "AD_CLASSIFIER_MAX_SEQUENCE_LENGTH";
pub const INTRA_THREADS_ENV: &str = "AD_CLASSIFIER_INTRA_THREADS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown predictor '{0}', expected one of: model, heuristic, auto")]
    UnknownPredictor(String),
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Which predictor the service answers with.
///
/// The fallback to the heuristic is never implicit: it happens only under
/// `Auto`, and health then reports `model_loaded: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictorKind {
    /// The fine-tuned model only. A missing model makes every prediction
    /// request fail as service-unavailable (503) instead of falling back.
    Model,
    /// The keyword heuristic only; no model is loaded.
    Heuristic,
    /// Degraded mode: the model when it loaded, otherwise the keyword
    /// heuristic, so a missing artifact never takes the service down.
    /// Choose `Model` to get 503s rather than heuristic answers.
    #[default]
    Auto,
}

impl FromStr for PredictorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model" => Ok(Self::Model),
            "heuristic" | "keyword" => Ok(Self::Heuristic),
            "auto" => Ok(Self::Auto),
            _ => Err(ConfigError::UnknownPredictor(s.to_string())),
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Model => "model",
            Self::Heuristic => "heuristic",
            Self::Auto => "auto",
        })
    }
}

/// Settings for [`ClassificationService`](crate::ClassificationService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding `model.onnx`, `tokenizer.json` and optionally `config.json`
    pub model_dir: PathBuf,
    pub predictor: PredictorKind,
    pub runtime: RuntimeConfig,
    pub max_sequence_length: usize,
    pub batch_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_dir: ModelArtifact::default_dir(),
            predictor: PredictorKind::default(),
            runtime: RuntimeConfig::default(),
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Reads the `AD_CLASSIFIER_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(MODEL_DIR_ENV) {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(kind) = lookup(PREDICTOR_ENV) {
            config.predictor = kind.parse()?;
        }
        if let Some(value) = lookup(BATCH_SIZE_ENV) {
            config.batch_size = parse_positive(BATCH_SIZE_ENV, &value)?;
        }
        if let Some(value) = lookup(MAX_SEQUENCE_LENGTH_ENV) {
            config.max_sequence_length = parse_positive(MAX_SEQUENCE_LENGTH_ENV, &value)?;
        }
        if let Some(value) = lookup(INTRA_THREADS_ENV) {
            config.runtime.intra_threads = parse_positive(INTRA_THREADS_ENV, &value)?;
        }
        Ok(config)
    }

    pub fn artifact(&self) -> ModelArtifact {
        ModelArtifact::new(&self.model_dir)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}
