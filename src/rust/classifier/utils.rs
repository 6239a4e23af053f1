use ndarray::{Array1, ArrayView1};

/// Softmax over `logits`, shifted by the maximum logit so `exp` cannot overflow.
pub(crate) fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exps = logits.mapv(|x| (x - max).exp());
    let sum = exps.sum();
    if sum > 0.0 && sum.is_finite() {
        exps / sum
    } else {
        Array1::from_elem(logits.len(), 1.0 / logits.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(array![1.0, 2.0, 3.0, -4.0].view());
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_stay_finite() {
        let probs = softmax(array![1000.0, 999.0, -1000.0].view());
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.sum() - 1.0).abs() < 1e-6);
        assert!(probs[0] > 0.7);
    }

    #[test]
    fn test_softmax_uniform_for_equal_logits() {
        let probs = softmax(array![0.5, 0.5, 0.5, 0.5].view());
        for p in probs.iter() {
            assert!((p - 0.25).abs() < 1e-6);
        }
    }
}
