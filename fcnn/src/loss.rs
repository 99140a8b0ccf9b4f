use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Predictions are clipped into `[CLIP, 1 - CLIP]` before taking the logarithm.
pub const CROSS_ENTROPY_CLIP: f64 = 1e-10;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LossFn {
    /// Cross-entropy paired with a softmax activation. The combined gradient with respect to
    /// the pre-activations is `actual - expected`.
    #[default]
    CrossEntropyWithSoftmax,
    MeanSquared,
}

impl LossFn {
    /// Gradient of the loss, used as the seed of the backward pass.
    pub fn output_gradient<T: DTypeFloat>(
        &self,
        actual: &Matrix<T>,
        expected: &Matrix<T>,
    ) -> Result<Matrix<T>> {
        match self {
            LossFn::CrossEntropyWithSoftmax => actual.sub(expected),
            LossFn::MeanSquared => {
                let mut diff = actual.sub(expected)?;
                diff.scale_in_place(T::from_f64(2.0));
                Ok(diff)
            }
        }
    }

    /// Loss value averaged over the examples (columns).
    pub fn loss<T: DTypeFloat>(&self, actual: &Matrix<T>, expected: &Matrix<T>) -> Result<T> {
        match self {
            LossFn::CrossEntropyWithSoftmax => cross_entropy(actual, expected),
            LossFn::MeanSquared => mean_squared_error(actual, expected),
        }
    }
}

fn check_shapes<T>(op: &'static str, predictions: &Matrix<T>, labels: &Matrix<T>) -> Result<()> {
    if predictions.shape() != labels.shape() {
        return Err(Error::mismatch(op, predictions.shape(), labels.shape()));
    }
    Ok(())
}

/// Mean categorical cross-entropy of column-per-example predictions against one-hot labels.
pub fn cross_entropy<T: DTypeFloat>(predictions: &Matrix<T>, labels: &Matrix<T>) -> Result<T> {
    check_shapes("cross_entropy", predictions, labels)?;
    if predictions.cols() == 0 {
        return Ok(T::ZERO);
    }
    let lo = T::from_f64(CROSS_ENTROPY_CLIP);
    let hi = T::ONE - lo;
    let log_p = predictions.map(|p| p.max(lo).min(hi).ln());
    let total = log_p.hadamard(labels)?.sum();
    Ok(-total / T::from_usize(predictions.cols()))
}

pub fn mean_squared_error<T: DTypeFloat>(predictions: &Matrix<T>, labels: &Matrix<T>) -> Result<T> {
    check_shapes("mean_squared_error", predictions, labels)?;
    if predictions.cols() == 0 {
        return Ok(T::ZERO);
    }
    let diff = predictions.sub(labels)?;
    let total = diff.hadamard(&diff)?.sum();
    Ok(total / T::from_usize(predictions.cols()))
}
