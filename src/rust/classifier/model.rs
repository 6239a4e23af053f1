use std::sync::Arc;

use log::debug;
use ndarray::{Array2, ArrayView1};
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::SequenceClassification;
use super::error::ClassifierError;
use super::prediction::{AdInput, CategoryScores, PredictionResult};
use super::predictor::Predictor;
use super::utils::softmax;
use crate::artifact::ModelArtifact;
use crate::taxonomy::CATEGORY_COUNT;

/// A thread-safe ad classifier backed by a fine-tuned transformer exported to ONNX.
///
/// The model emits one logit per taxonomy category; logit `i` belongs to
/// `CategoryId::ALL[i]`. Scores are the softmax of the logits, so
/// `all_predictions` sums to 1 and `category` is its argmax.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `Tokenizer` and `Session` are wrapped in `Arc` and only used through `&self`
/// - the remaining fields are plain values
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ad_classifier::{AdInput, ModelArtifact, ModelPredictor, Predictor};
/// use std::sync::Arc;
/// use std::thread;
///
/// let predictor = Arc::new(ModelPredictor::load(&ModelArtifact::new("./ad_classifier"))?);
///
/// let shared = Arc::clone(&predictor);
/// thread::spawn(move || {
///     shared.predict(&AdInput::new("اجاره دفتر اداری", "دفتر 100 متری")).unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ModelPredictor {
    pub model_path: String,
    pub tokenizer_path: String,
    pub(crate) tokenizer: Arc<Tokenizer>,
    pub(crate) session: Arc<Session>,
    pub(crate) max_sequence_length: usize,
    pub(crate) batch_size: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ModelPredictor>();
    }
};

impl SequenceClassification for ModelPredictor {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }
}

impl ModelPredictor {
    /// Creates a new ModelPredictorBuilder for fluent construction
    pub fn builder() -> super::builder::ModelPredictorBuilder {
        super::builder::ModelPredictorBuilder::new()
    }

    /// Loads the artifact with default settings.
    ///
    /// # Errors
    /// - `ModelLoadError` if the artifact is missing, corrupt or does not match the taxonomy
    pub fn load(artifact: &ModelArtifact) -> Result<Self, ClassifierError> {
        Self::builder().with_artifact(artifact)?.build()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ModelInfo {
        super::ModelInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            num_labels: CATEGORY_COUNT,
            max_sequence_length: self.max_sequence_length,
            batch_size: self.batch_size,
        }
    }

    /// Number of tokens the model sees for `ad`, after truncation.
    pub fn token_count(&self, ad: &AdInput) -> Result<usize, ClassifierError> {
        self.count_tokens(&ad.text())
    }
}

impl Predictor for ModelPredictor {
    fn name(&self) -> &'static str {
        "model"
    }

    fn predict(&self, ad: &AdInput) -> Result<PredictionResult, ClassifierError> {
        self.predict_batch(std::slice::from_ref(ad))?
            .pop()
            .ok_or_else(|| ClassifierError::PredictionError("Model returned no prediction".into()))
    }

    fn predict_batch(&self, ads: &[AdInput]) -> Result<Vec<PredictionResult>, ClassifierError> {
        predict_in_chunks(ads, self.batch_size, |texts| self.logits(texts))
    }
}

/// Splits `ads` into chunks of at most `batch_size`, runs `logits` once per
/// chunk and decodes every row. Results line up one-to-one with `ads`.
pub(crate) fn predict_in_chunks<F>(
    ads: &[AdInput],
    batch_size: usize,
    mut logits: F,
) -> Result<Vec<PredictionResult>, ClassifierError>
where
    F: FnMut(Vec<String>) -> Result<Array2<f32>, ClassifierError>,
{
    let mut results = Vec::with_capacity(ads.len());
    for chunk in ads.chunks(batch_size.max(1)) {
        let texts = chunk.iter().map(AdInput::text).collect();
        let rows = logits(texts)?;
        if rows.nrows() != chunk.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Got {} rows of logits for {} ads",
                rows.nrows(),
                chunk.len()
            )));
        }
        debug!("Ran forward pass over {} ads", chunk.len());
        for row in rows.rows() {
            results.push(result_from_logits(row)?);
        }
    }
    Ok(results)
}

/// Turns one row of logits into a prediction: softmax, then argmax.
pub(crate) fn result_from_logits(logits: ArrayView1<f32>) -> Result<PredictionResult, ClassifierError> {
    if logits.len() != CATEGORY_COUNT {
        return Err(ClassifierError::PredictionError(format!(
            "Model produced {} logits, expected {}",
            logits.len(),
            CATEGORY_COUNT
        )));
    }
    if logits.iter().any(|x| !x.is_finite()) {
        return Err(ClassifierError::PredictionError("Model produced non-finite logits".into()));
    }

    let probabilities = softmax(logits);
    let scores = CategoryScores::from_slice(&probabilities.to_vec())?;
    Ok(PredictionResult::new(scores.argmax(), scores))
}
