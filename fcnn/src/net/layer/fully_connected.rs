use crate::activation::ActivationFn;
use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::{Matrix, RandomConfig};
use crate::net::initializer::WeightInitializer;
use crate::net::layer::Layer;
use std::fmt::{Debug, Formatter};

/// Fully connected layer computing `activation(weights * input + biases)` for a batch of
/// column vectors.
#[derive(Clone)]
pub struct DenseLayer<T> {
    input_size: usize,
    output_size: usize,
    activation_fn: ActivationFn,
    weights: Matrix<T>,
    biases: Matrix<T>,
    // cached by forward
    last_inner_potential: Matrix<T>,
    last_input: Matrix<T>,
    // written by backward
    weight_gradient: Matrix<T>,
    bias_gradient: Matrix<T>,
    // optimizer state
    weight_velocity: Matrix<T>,
    bias_velocity: Matrix<T>,
}

impl<T: DTypeFloat> DenseLayer<T> {
    /// Creates a layer with uniform `[0, 1)` weights drawn from the default [`RandomConfig`].
    pub fn new(input_size: usize, output_size: usize, activation_fn: ActivationFn) -> Self {
        let weights = Matrix::random(output_size, input_size, &RandomConfig::default());
        Self::with_parameters(weights, Matrix::zeros(output_size, 1), activation_fn)
    }

    pub fn with_initializer(
        input_size: usize,
        output_size: usize,
        activation_fn: ActivationFn,
        initializer: &mut WeightInitializer,
    ) -> Self {
        let weights = initializer.weights(input_size, output_size);
        let biases = initializer.biases(output_size);
        Self::with_parameters(weights, biases, activation_fn)
    }

    /// Creates a layer from explicit parameters. `biases` must be an `output x 1` column.
    pub fn from_parameters(
        weights: Matrix<T>,
        biases: Matrix<T>,
        activation_fn: ActivationFn,
    ) -> Result<Self> {
        if biases.shape() != (weights.rows(), 1) {
            return Err(Error::mismatch("from_parameters", weights.shape(), biases.shape()));
        }
        Ok(Self::with_parameters(weights, biases, activation_fn))
    }

    fn with_parameters(weights: Matrix<T>, biases: Matrix<T>, activation_fn: ActivationFn) -> Self {
        let (output_size, input_size) = weights.shape();
        DenseLayer {
            input_size,
            output_size,
            activation_fn,
            weights,
            biases,
            last_inner_potential: Matrix::zeros(output_size, 0),
            last_input: Matrix::zeros(input_size, 0),
            weight_gradient: Matrix::zeros(output_size, input_size),
            bias_gradient: Matrix::zeros(output_size, 1),
            weight_velocity: Matrix::zeros(output_size, input_size),
            bias_velocity: Matrix::zeros(output_size, 1),
        }
    }

    #[inline]
    pub fn activation_fn(&self) -> ActivationFn {
        self.activation_fn
    }

    #[inline]
    pub fn weights(&self) -> &Matrix<T> {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &Matrix<T> {
        &self.biases
    }

    #[inline]
    pub fn weight_gradient(&self) -> &Matrix<T> {
        &self.weight_gradient
    }

    #[inline]
    pub fn bias_gradient(&self) -> &Matrix<T> {
        &self.bias_gradient
    }

    #[inline]
    pub fn weight_velocity(&self) -> &Matrix<T> {
        &self.weight_velocity
    }

    #[inline]
    pub fn bias_velocity(&self) -> &Matrix<T> {
        &self.bias_velocity
    }

    #[inline]
    pub fn weight_velocity_mut(&mut self) -> &mut Matrix<T> {
        &mut self.weight_velocity
    }

    #[inline]
    pub fn bias_velocity_mut(&mut self) -> &mut Matrix<T> {
        &mut self.bias_velocity
    }

    /// Backward pass with the activation derivative applied to the cached pre-activations.
    fn backward_through_activation(&mut self, gradient: &Matrix<T>) -> Result<Matrix<T>> {
        if gradient.shape() != self.last_inner_potential.shape() {
            return Err(Error::mismatch(
                "backward",
                self.last_inner_potential.shape(),
                gradient.shape(),
            ));
        }
        self.activation_fn.derivative(&mut self.last_inner_potential)?;
        let hnc = self.last_inner_potential.hadamard(gradient)?;
        self.propagate(hnc)
    }

    /// Stores the parameter gradients for `hnc` (the loss gradient with respect to the
    /// pre-activations) and returns the gradient with respect to the layer input.
    pub(crate) fn propagate(&mut self, hnc: Matrix<T>) -> Result<Matrix<T>> {
        self.last_input.transpose();
        let weight_gradient = hnc.matmul(&self.last_input);
        self.last_input.transpose();
        let weight_gradient = weight_gradient?;
        let bias_gradient = hnc.sum_columns();
        let next = hnc.into_transposed().matmul(&self.weights)?.into_transposed();
        self.weight_gradient = weight_gradient;
        self.bias_gradient = bias_gradient;
        Ok(next)
    }
}

impl<T: DTypeFloat> Layer<T> for DenseLayer<T> {
    fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        if input.rows() != self.input_size {
            return Err(Error::mismatch("forward", self.weights.shape(), input.shape()));
        }
        let mut result = self.weights.matmul(input)?;
        result.add_to_all_cols(&self.biases)?;
        self.last_input = input.clone();
        self.last_inner_potential = result.clone();
        self.activation_fn.compute(&mut result)?;
        Ok(result)
    }

    fn backward(&mut self, gradient: &Matrix<T>) -> Result<Matrix<T>> {
        self.backward_through_activation(gradient)
    }

    fn update(&mut self, weights: Matrix<T>, biases: Matrix<T>) -> Result<()> {
        if weights.shape() != self.weights.shape() {
            return Err(Error::mismatch("update", self.weights.shape(), weights.shape()));
        }
        if biases.shape() != self.biases.shape() {
            return Err(Error::mismatch("update", self.biases.shape(), biases.shape()));
        }
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    #[inline]
    fn input_size(&self) -> usize {
        self.input_size
    }

    #[inline]
    fn output_size(&self) -> usize {
        self.output_size
    }

    #[inline]
    fn dense(&self) -> &DenseLayer<T> {
        self
    }

    #[inline]
    fn dense_mut(&mut self) -> &mut DenseLayer<T> {
        self
    }
}

impl<T> Debug for DenseLayer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseLayer")
            .field("input_size", &self.input_size)
            .field("output_size", &self.output_size)
            .field("activation_fn", &self.activation_fn)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net::initializer::InitializerKind;
    use approx::assert_abs_diff_eq;

    fn mat(rows: usize, cols: usize, data: &[f32]) -> Matrix<f32> {
        Matrix::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn test_forward_relu() {
        let mut layer = DenseLayer::from_parameters(
            mat(2, 2, &[1., -1., 2., 1.]),
            mat(2, 1, &[0., 1.]),
            ActivationFn::ReLU,
        )
        .unwrap();
        let out = layer.forward(&mat(2, 1, &[1., 2.])).unwrap();
        assert_eq!(out.as_slice(), &[0., 5.]);
    }

    #[test]
    fn test_forward_input_mismatch() {
        let mut layer = DenseLayer::<f32>::new(3, 2, ActivationFn::ReLU);
        assert!(matches!(
            layer.forward(&Matrix::zeros(2, 4)),
            Err(Error::DimensionMismatch { op: "forward", .. })
        ));
    }

    #[test]
    fn test_new_shapes() {
        let layer = DenseLayer::<f64>::new(3, 2, ActivationFn::leaky_relu());
        assert_eq!(layer.weights().shape(), (2, 3));
        assert_eq!(layer.biases(), &Matrix::zeros(2, 1));
        assert!(layer.weights().as_slice().iter().all(|&w| (0.0..1.0).contains(&w)));
        let mut init = WeightInitializer::seed_from_u64(InitializerKind::HeNormal, 3);
        let layer = DenseLayer::<f64>::with_initializer(3, 2, ActivationFn::ReLU, &mut init);
        assert_eq!(layer.weights().shape(), (2, 3));
    }

    #[test]
    fn test_backward_before_forward() {
        let mut layer = DenseLayer::<f32>::new(3, 2, ActivationFn::ReLU);
        assert!(matches!(
            layer.backward(&Matrix::ones(2, 4)),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_backward() {
        let mut layer = DenseLayer::from_parameters(
            mat(2, 3, &[1., 0., -1., 0.5, 0.5, 0.5]),
            mat(2, 1, &[0., 0.]),
            ActivationFn::ReLU,
        )
        .unwrap();
        // columns are examples: x0 = (1, 2, 3), x1 = (3, 0, 1)
        let input = mat(3, 2, &[1., 3., 2., 0., 3., 1.]);
        let out = layer.forward(&input).unwrap();
        // z = [[-2, 2], [3, 2]]
        assert_eq!(out.as_slice(), &[0., 2., 3., 2.]);

        let grad = mat(2, 2, &[1., 1., 1., -1.]);
        let next = layer.backward(&grad).unwrap();
        // hnc = [[0, 1], [1, -1]]
        let wg = layer.weight_gradient();
        assert_eq!(wg.shape(), (2, 3));
        assert_eq!(wg.to_row_major_vec(), vec![3., 0., 1., -2., 2., 2.]);
        assert_eq!(layer.bias_gradient().as_slice(), &[1., 0.]);
        // next = W^T * hnc
        assert_eq!(next.shape(), (3, 2));
        assert_abs_diff_eq!(
            &next.to_row_major_vec()[..],
            &[0.5, 0.5, 0.5, -0.5, 0.5, -1.5][..],
            epsilon = 1e-6
        );
        // the cached input is left untransposed
        assert_eq!(layer.last_input, input);
    }

    #[test]
    fn test_update_replaces_parameters() {
        let mut layer = DenseLayer::<f32>::new(2, 2, ActivationFn::ReLU);
        layer.update(Matrix::ones(2, 2), mat(2, 1, &[1., 2.])).unwrap();
        assert_eq!(layer.weights(), &Matrix::ones(2, 2));
        assert_eq!(layer.biases().as_slice(), &[1., 2.]);
        assert!(layer.update(Matrix::ones(2, 3), Matrix::zeros(2, 1)).is_err());
        assert!(layer.update(Matrix::ones(2, 2), Matrix::zeros(1, 2)).is_err());
    }
}
