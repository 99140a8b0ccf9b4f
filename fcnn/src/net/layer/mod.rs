mod concrete;
mod fully_connected;
mod softmax_output;

use crate::dtype::DTypeFloat;
use crate::error::Result;
use crate::loss::LossFn;
use crate::matrix::Matrix;
use std::fmt::Debug;

pub use concrete::ConcreteLayer;
pub use fully_connected::DenseLayer;
pub use softmax_output::SoftmaxOutputLayer;

/// A trainable layer operating on batches stored one example per column.
pub trait Layer<T: DTypeFloat>: Debug {
    /// Computes the activations for `input` and caches what the backward pass needs.
    fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>>;

    /// Consumes the loss gradient with respect to the layer output, stores the parameter
    /// gradients and returns the gradient with respect to the layer input.
    fn backward(&mut self, gradient: &Matrix<T>) -> Result<Matrix<T>>;

    /// Replaces the weights and biases.
    fn update(&mut self, weights: Matrix<T>, biases: Matrix<T>) -> Result<()>;

    fn input_size(&self) -> usize;
    fn output_size(&self) -> usize;

    fn dense(&self) -> &DenseLayer<T>;
    fn dense_mut(&mut self) -> &mut DenseLayer<T>;
}

/// A layer that terminates a network and seeds the backward pass.
pub trait OutputLayer<T: DTypeFloat>: Layer<T> {
    fn loss_fn(&self) -> LossFn;

    fn output_gradient(&self, actual: &Matrix<T>, expected: &Matrix<T>) -> Result<Matrix<T>> {
        self.loss_fn().output_gradient(actual, expected)
    }
}
