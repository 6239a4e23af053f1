use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::taxonomy::{CategoryId, CATEGORY_COUNT};

/// Environment variable that overrides the model artifact location.
pub const MODEL_DIR_ENV: &str = "AD_CLASSIFIER_MODEL_DIR";

/// Directory name the training run writes its artifact to.
pub const DEFAULT_ARTIFACT_NAME: &str = "ad_classifier";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid model config: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Model declares {actual} labels, expected {expected}")]
    LabelCount { expected: usize, actual: usize },
    #[error("Label {index} is '{actual}', expected '{expected}'")]
    LabelMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
}

/// The label section of a HuggingFace `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelConfig {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub num_labels: Option<usize>,
}

/// A fine-tuned classifier exported to a directory holding `model.onnx`,
/// `tokenizer.json` and, optionally, the HuggingFace `config.json`.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    dir: PathBuf,
}

impl ModelArtifact {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Artifact at the default location, see [`ModelArtifact::default_dir`].
    pub fn locate() -> Self {
        Self::new(Self::default_dir())
    }

    /// Returns the default artifact directory
    pub fn default_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(MODEL_DIR_ENV) {
            return PathBuf::from(path);
        }

        // 2. Training output in the working directory
        let local = PathBuf::from(".").join(DEFAULT_ARTIFACT_NAME);
        if local.exists() {
            return local;
        }

        // 3. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_local_dir() {
            return data_dir.join("ad-classifier").join(DEFAULT_ARTIFACT_NAME);
        }

        // 4. Fall back to the working directory even though it is missing
        local
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    pub fn is_present(&self) -> bool {
        let model_path = self.model_path();
        let tokenizer_path = self.tokenizer_path();
        log::info!("Checking for model artifact:");
        log::info!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::info!("  Tokenizer path: {:?} (exists: {})", tokenizer_path, tokenizer_path.exists());
        model_path.exists() && tokenizer_path.exists()
    }

    /// Fails with `NotFound` naming the first required file that is missing.
    pub fn ensure_present(&self) -> Result<(), ArtifactError> {
        for path in [self.model_path(), self.tokenizer_path()] {
            if !path.exists() {
                return Err(ArtifactError::NotFound(path));
            }
        }
        Ok(())
    }

    /// Reads the label mapping from `config.json`, if the artifact ships one.
    pub fn label_config(&self) -> Result<Option<LabelConfig>, ArtifactError> {
        let path = self.config_path();
        if !path.exists() {
            log::info!("No config.json at {:?}, skipping label check", path);
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Checks that the artifact's labels line up with the taxonomy.
    ///
    /// Generic `LABEL_<n>` names are accepted since they carry no ordering of
    /// their own.
    pub fn verify_labels(&self) -> Result<(), ArtifactError> {
        match self.label_config()? {
            Some(config) => verify_label_config(&config),
            None => Ok(()),
        }
    }
}

pub(crate) fn verify_label_config(config: &LabelConfig) -> Result<(), ArtifactError> {
    if let Some(num_labels) = config.num_labels {
        if num_labels != CATEGORY_COUNT {
            return Err(ArtifactError::LabelCount {
                expected: CATEGORY_COUNT,
                actual: num_labels,
            });
        }
    }
    if config.id2label.is_empty() {
        return Ok(());
    }
    if config.id2label.len() != CATEGORY_COUNT {
        return Err(ArtifactError::LabelCount {
            expected: CATEGORY_COUNT,
            actual: config.id2label.len(),
        });
    }

    for category in CategoryId::ALL {
        let index = category.index();
        let actual = config
            .id2label
            .get(&index.to_string())
            .map(String::as_str)
            .unwrap_or_default();
        if actual != category.slug() && actual != format!("LABEL_{}", index) {
            return Err(ArtifactError::LabelMismatch {
                index,
                expected: category.slug().to_string(),
                actual: actual.to_string(),
            });
        }
    }
    log::info!("Model labels match the category taxonomy");
    Ok(())
}
