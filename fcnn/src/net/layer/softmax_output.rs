use crate::activation::ActivationFn;
use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::loss::LossFn;
use crate::matrix::Matrix;
use crate::net::initializer::WeightInitializer;
use crate::net::layer::{DenseLayer, Layer, OutputLayer};
use std::fmt::{Debug, Formatter};

/// Dense layer with a softmax activation trained against cross-entropy loss.
#[derive(Clone)]
pub struct SoftmaxOutputLayer<T> {
    dense: DenseLayer<T>,
}

impl<T: DTypeFloat> SoftmaxOutputLayer<T> {
    pub fn new(input_size: usize, output_size: usize) -> Self {
        SoftmaxOutputLayer {
            dense: DenseLayer::new(input_size, output_size, ActivationFn::Softmax),
        }
    }

    pub fn with_initializer(
        input_size: usize,
        output_size: usize,
        initializer: &mut WeightInitializer,
    ) -> Self {
        SoftmaxOutputLayer {
            dense: DenseLayer::with_initializer(
                input_size,
                output_size,
                ActivationFn::Softmax,
                initializer,
            ),
        }
    }

    pub fn from_parameters(weights: Matrix<T>, biases: Matrix<T>) -> Result<Self> {
        Ok(SoftmaxOutputLayer {
            dense: DenseLayer::from_parameters(weights, biases, ActivationFn::Softmax)?,
        })
    }
}

impl<T: DTypeFloat> Layer<T> for SoftmaxOutputLayer<T> {
    fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        self.dense.forward(input)
    }

    /// `gradient` is already `predicted - expected`, the combined softmax and cross-entropy
    /// derivative, so it is propagated without another activation derivative.
    fn backward(&mut self, gradient: &Matrix<T>) -> Result<Matrix<T>> {
        let (rows, cols) = gradient.shape();
        if rows != self.dense.output_size() {
            return Err(Error::mismatch("backward", self.dense.weights().shape(), (rows, cols)));
        }
        self.dense.propagate(gradient.clone())
    }

    fn update(&mut self, weights: Matrix<T>, biases: Matrix<T>) -> Result<()> {
        self.dense.update(weights, biases)
    }

    #[inline]
    fn input_size(&self) -> usize {
        self.dense.input_size()
    }

    #[inline]
    fn output_size(&self) -> usize {
        self.dense.output_size()
    }

    #[inline]
    fn dense(&self) -> &DenseLayer<T> {
        &self.dense
    }

    #[inline]
    fn dense_mut(&mut self) -> &mut DenseLayer<T> {
        &mut self.dense
    }
}

impl<T: DTypeFloat> OutputLayer<T> for SoftmaxOutputLayer<T> {
    #[inline]
    fn loss_fn(&self) -> LossFn {
        LossFn::CrossEntropyWithSoftmax
    }
}

impl<T> Debug for SoftmaxOutputLayer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SoftmaxOutputLayer").field(&self.dense).finish()
    }
}
