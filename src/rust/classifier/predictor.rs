use super::error::ClassifierError;
use super::prediction::{AdInput, PredictionResult};

/// Anything that can turn an ad into a [`PredictionResult`].
///
/// Both the keyword heuristic and the model-backed classifier implement this,
/// and the serving layer only ever talks to `dyn Predictor`, so which one
/// answered a request is not visible in the response.
pub trait Predictor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Classifies a single ad.
    fn predict(&self, ad: &AdInput) -> Result<PredictionResult, ClassifierError>;

    /// Classifies several ads. The result has one entry per input, in input order.
    ///
    /// Equivalent to calling [`Predictor::predict`] on each input; implementors
    /// may override this to share work across the batch.
    fn predict_batch(&self, ads: &[AdInput]) -> Result<Vec<PredictionResult>, ClassifierError> {
        ads.iter().map(|ad| self.predict(ad)).collect()
    }
}
