use std::collections::HashMap;

use ndarray::{Array2, Ix2};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::error::ClassifierError;

/// Model inputs this crate knows how to fill.
pub(crate) const SUPPORTED_INPUTS: [&str; 3] = ["input_ids", "attention_mask", "token_type_ids"];

/// Sets truncation to `max_sequence_length` tokens and pads every batch to
/// its longest member.
pub(crate) fn configure_tokenizer(tokenizer: &mut Tokenizer, max_sequence_length: usize) -> Result<(), ClassifierError> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_sequence_length,
            ..Default::default()
        }))
        .map_err(|e| ClassifierError::ModelLoadError(format!("Failed to set truncation: {}", e)))?;
    let padding = tokenizer.get_padding().cloned().unwrap_or_default();
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..padding
    }));
    Ok(())
}

/// Builds the `[batch, seq_len]` int64 array for the model input `name`.
///
/// Rows shorter than the longest encoding are filled with 0, which is both
/// the attention mask and the type id for padding.
pub(crate) fn input_array(name: &str, encodings: &[Encoding]) -> Result<Array2<i64>, ClassifierError> {
    let values: fn(&Encoding) -> &[u32] = match name {
        "input_ids" => Encoding::get_ids,
        "attention_mask" => Encoding::get_attention_mask,
        "token_type_ids" => Encoding::get_type_ids,
        other => {
            return Err(ClassifierError::PredictionError(format!(
                "Unsupported model input '{}'",
                other
            )))
        }
    };

    let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
    Ok(Array2::from_shape_fn((encodings.len(), seq_len), |(i, j)| {
        values(&encodings[i]).get(j).map_or(0, |&v| i64::from(v))
    }))
}

/// Runs a sequence-classification model over raw text.
///
/// This trait covers the path from text to logits:
/// 1. Tokenization with truncation and batch padding (configured on the tokenizer)
/// 2. Building `[batch, seq_len]` input tensors
/// 3. One forward pass producing `[batch, num_labels]` logits
///
/// The ONNX model is expected to:
/// - Take any of `input_ids`, `attention_mask` and `token_type_ids` (int64)
/// - Return the classification logits as its first output
pub(crate) trait SequenceClassification {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Counts the tokens the model would see for `text`, after truncation and
    /// including special tokens.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_attention_mask().iter().filter(|&&m| m != 0).count())
    }

    /// Tokenizes a batch; all encodings come back padded to the same length.
    fn encode(&self, texts: Vec<String>) -> Result<Vec<Encoding>, ClassifierError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        tokenizer.encode_batch(texts, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
    }

    /// Produces one row of logits per input text.
    ///
    /// # Model Input Format
    /// - input_ids: Token IDs [batch_size, sequence_length]
    /// - attention_mask: 1 for real tokens, 0 for padding [batch_size, sequence_length]
    /// - token_type_ids: segment IDs, all 0 for single sentences [batch_size, sequence_length]
    ///
    /// # Errors
    /// - `TokenizerError` from encoding
    /// - `PredictionError` if the session is missing, tensor creation or the
    ///   forward pass fails, or the output is not `[batch_size, num_labels]`
    fn logits(&self, texts: Vec<String>) -> Result<Array2<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::PredictionError("Session not initialized".into()))?;

        let batch_size = texts.len();
        let encodings = self.encode(texts)?;

        let mut input_tensors = HashMap::new();
        for input in &session.inputs {
            let array = input_array(&input.name, &encodings)?;
            let tensor = Tensor::from_array(array)
                .map_err(|e| ClassifierError::PredictionError(format!("Failed to create {} tensor: {}", input.name, e)))?;
            input_tensors.insert(input.name.as_str(), tensor);
        }

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract output tensor: {}", e)))?;

        let logits = output_tensor.into_dimensionality::<Ix2>()
            .map_err(|e| ClassifierError::PredictionError(format!("Unexpected logits shape: {}", e)))?;
        if logits.nrows() != batch_size {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} rows for a batch of {}",
                logits.nrows(),
                batch_size
            )));
        }

        Ok(logits.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD_LEVEL_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[PAD]": 0, "[UNK]": 1, "shop": 2, "rent": 3, "city": 4, "center": 5, "sale": 6},
            "unk_token": "[UNK]"
        }
    }"#;

    fn word_level_tokenizer(max_sequence_length: usize) -> Tokenizer {
        let mut tokenizer: Tokenizer = WORD_LEVEL_TOKENIZER.parse().unwrap();
        configure_tokenizer(&mut tokenizer, max_sequence_length).unwrap();
        tokenizer
    }

    fn encode(tokenizer: &Tokenizer, texts: &[&str]) -> Vec<Encoding> {
        tokenizer.encode_batch(texts.to_vec(), true).unwrap()
    }

    #[test]
    fn test_batch_is_padded_to_longest() {
        let tokenizer = word_level_tokenizer(256);
        let encodings = encode(&tokenizer, &["shop rent city center", "sale"]);

        let ids = input_array("input_ids", &encodings).unwrap();
        assert_eq!(ids.dim(), (2, 4));
        assert_eq!(ids.row(0).to_vec(), vec![2, 3, 4, 5]);
        assert_eq!(ids.row(1).to_vec(), vec![6, 0, 0, 0]);

        let mask = input_array("attention_mask", &encodings).unwrap();
        assert_eq!(mask.row(0).to_vec(), vec![1, 1, 1, 1]);
        assert_eq!(mask.row(1).to_vec(), vec![1, 0, 0, 0]);

        let type_ids = input_array("token_type_ids", &encodings).unwrap();
        assert_eq!(type_ids.dim(), (2, 4));
        assert!(type_ids.iter().all(|&t| t == 0));
    }

    #[test]
    fn test_unpadded_rows_are_zero_filled() {
        let tokenizer: Tokenizer = WORD_LEVEL_TOKENIZER.parse().unwrap();
        let encodings = encode(&tokenizer, &["sale", "shop rent city"]);
        assert_eq!(encodings[0].get_ids().len(), 1);

        let mask = input_array("attention_mask", &encodings).unwrap();
        assert_eq!(mask.dim(), (2, 3));
        assert_eq!(mask.row(0).to_vec(), vec![1, 0, 0]);
    }

    #[test]
    fn test_long_input_truncates_to_max_length() {
        let long_text = "shop rent city center ".repeat(100);

        let tokenizer = word_level_tokenizer(256);
        let encodings = encode(&tokenizer, &[long_text.as_str(), "sale"]);
        assert_eq!(encodings[0].get_ids().len(), 256);

        let mask = input_array("attention_mask", &encodings).unwrap();
        assert_eq!(mask.dim(), (2, 256));
        assert_eq!(mask.row(0).sum(), 256);
        assert_eq!(mask.row(1).sum(), 1);

        let tokenizer = word_level_tokenizer(8);
        let encodings = encode(&tokenizer, &[long_text.as_str()]);
        assert_eq!(input_array("input_ids", &encodings).unwrap().dim(), (1, 8));
    }

    #[test]
    fn test_unknown_input_rejected() {
        let tokenizer = word_level_tokenizer(16);
        let encodings = encode(&tokenizer, &["shop"]);
        assert!(matches!(
            input_array("pixel_values", &encodings),
            Err(ClassifierError::PredictionError(_))
        ));
    }

    #[test]
    fn test_empty_batch() {
        let array = input_array("input_ids", &[]).unwrap();
        assert_eq!(array.dim(), (0, 0));
    }
}
