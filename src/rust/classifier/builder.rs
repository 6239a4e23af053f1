use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::{configure_tokenizer, SequenceClassification, SUPPORTED_INPUTS};
use super::error::ClassifierError;
use super::model::ModelPredictor;
use crate::artifact::ModelArtifact;
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::taxonomy::CATEGORY_COUNT;

/// Maximum number of tokens fed to the model per ad; longer inputs are truncated.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 256;
/// Number of ads run through the model in one forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// A builder for constructing a ModelPredictor with a fluent interface.
#[derive(Debug)]
pub struct ModelPredictorBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    max_sequence_length: usize,
    batch_size: usize,
    runtime_config: RuntimeConfig,
}

impl Default for ModelPredictorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceClassification for ModelPredictorBuilder {
    /// Returns a reference to the tokenizer if it exists
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    /// Returns a reference to the ONNX session if it exists
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl ModelPredictorBuilder {
    /// Creates a new empty ModelPredictorBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use ad_classifier::ModelPredictorBuilder;
    ///
    /// let builder = ModelPredictorBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            tokenizer: None,
            session: None,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// Must be called before the model is loaded to take effect.
    ///
    /// # Example
    /// ```
    /// use ad_classifier::{ModelPredictorBuilder, RuntimeConfig};
    ///
    /// let config = RuntimeConfig { intra_threads: 2, ..RuntimeConfig::default() };
    /// let builder = ModelPredictorBuilder::new()
    ///     .with_runtime_config(config);
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets how many tokens the model sees per ad.
    ///
    /// # Errors
    /// - `ValidationError` if `max_sequence_length` is zero
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Result<Self, ClassifierError> {
        if max_sequence_length == 0 {
            return Err(ClassifierError::ValidationError("Max sequence length must be positive".into()));
        }
        self.max_sequence_length = max_sequence_length;
        Ok(self)
    }

    /// Sets how many ads share one forward pass in `predict_batch`.
    ///
    /// # Errors
    /// - `ValidationError` if `batch_size` is zero
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ClassifierError> {
        if batch_size == 0 {
            return Err(ClassifierError::ValidationError("Batch size must be positive".into()));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Loads the model and tokenizer of a fine-tuned artifact directory
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or a
    ///   `ModelLoadError` if:
    ///   - The model is already set
    ///   - `model.onnx` or `tokenizer.json` is missing
    ///   - `config.json` is present but its labels do not match the taxonomy
    ///   - The model or tokenizer failed to load
    ///
    /// # Example
    /// ```no_run
    /// use ad_classifier::{ModelArtifact, ModelPredictorBuilder};
    ///
    /// let builder = ModelPredictorBuilder::new()
    ///     .with_artifact(&ModelArtifact::new("./ad_classifier"));
    /// ```
    pub fn with_artifact(self, artifact: &ModelArtifact) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::ModelLoadError("Model and tokenizer paths already set".to_string()));
        }

        artifact.ensure_present()?;
        artifact.verify_labels()?;

        let model_path = artifact.model_path();
        let tokenizer_path = artifact.tokenizer_path();
        self.load_files(&model_path, &tokenizer_path)
    }

    /// Sets a custom model and tokenizer path
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `tokenizer_path` - Path to the tokenizer file
    /// * `max_sequence_length` - Optional maximum sequence length. If not provided,
    ///   defaults to 256 tokens.
    ///
    /// # Example
    /// ```no_run
    /// use ad_classifier::ModelPredictorBuilder;
    ///
    /// let builder = ModelPredictorBuilder::new()
    ///     .with_custom_model(
    ///         "path/to/model.onnx",
    ///         "path/to/tokenizer.json",
    ///         Some(128)
    ///     );
    /// ```
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::ModelLoadError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::ModelLoadError("Model and tokenizer paths already set".to_string()));
        }

        // Validate paths exist
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::ModelLoadError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::ModelLoadError(format!("Tokenizer file not found: {}", tokenizer_path)));
        }

        if let Some(length) = max_sequence_length {
            self = self.with_max_sequence_length(length)?;
        }
        self.load_files(Path::new(model_path), Path::new(tokenizer_path))
    }

    fn load_files(mut self, model_path: &Path, tokenizer_path: &Path) -> Result<Self, ClassifierError> {
        // Load tokenizer
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::ModelLoadError(format!("Failed to load tokenizer: {}", e))
            })?;

        info!("Tokenizer loaded from {:?}", tokenizer_path);

        // Create session using the singleton environment
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load model: {}", e);
                ClassifierError::ModelLoadError(format!("Failed to load model {:?}: {}", model_path, e))
            })?;

        // Validate model structure
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Builds and returns the final ModelPredictor instance
    ///
    /// Configures truncation and batch padding on the tokenizer, then runs a
    /// test input through the model to check it produces one logit per category.
    ///
    /// # Returns
    /// * `Result<ModelPredictor, ClassifierError>` - The constructed predictor, or a
    ///   `ModelLoadError` if:
    ///   - No model has been loaded
    ///   - The tokenizer rejects the truncation settings
    ///   - The test inference fails or yields the wrong number of logits
    pub fn build(mut self) -> Result<ModelPredictor, ClassifierError> {
        let (model_path, tokenizer_path) = match (self.model_path.take(), self.tokenizer_path.take()) {
            (Some(model_path), Some(tokenizer_path)) => (model_path, tokenizer_path),
            _ => return Err(ClassifierError::ModelLoadError("Model and tokenizer paths must be set".to_string())),
        };

        let max_sequence_length = self.max_sequence_length;
        let tokenizer = self.tokenizer.as_mut()
            .ok_or_else(|| ClassifierError::ModelLoadError("No tokenizer loaded".into()))?;
        configure_tokenizer(tokenizer, max_sequence_length)?;

        let check = self.logits(vec!["آزمایش مدل".to_string()])
            .map_err(|e| ClassifierError::ModelLoadError(format!("Test inference failed: {}", e)))?;
        if check.ncols() != CATEGORY_COUNT {
            return Err(ClassifierError::ModelLoadError(format!(
                "Model produces {} logits, expected one per category ({})",
                check.ncols(),
                CATEGORY_COUNT
            )));
        }
        info!("Model produces {} logits per ad", check.ncols());

        let tokenizer = Arc::new(self.tokenizer.take()
            .ok_or_else(|| ClassifierError::ModelLoadError("No tokenizer loaded".into()))?);
        let session = Arc::new(self.session.take()
            .ok_or_else(|| ClassifierError::ModelLoadError("No ONNX model loaded".into()))?);

        Ok(ModelPredictor {
            model_path,
            tokenizer_path,
            tokenizer,
            session,
            max_sequence_length,
            batch_size: self.batch_size,
        })
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or an error if:
    ///   - The model has no inputs, or an input this crate cannot fill
    ///   - The model doesn't have any output tensors
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        // Check inputs
        let inputs = &session.inputs;
        if inputs.is_empty() {
            return Err(ClassifierError::ModelLoadError("Model has no inputs".to_string()));
        }
        if let Some(input) = inputs.iter().find(|i| !SUPPORTED_INPUTS.contains(&i.name.as_str())) {
            return Err(ClassifierError::ModelLoadError(format!(
                "Model input '{}' is not one of {:?}",
                input.name, SUPPORTED_INPUTS
            )));
        }

        // Check outputs
        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ClassifierError::ModelLoadError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}
