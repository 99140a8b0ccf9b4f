use super::{DenseLayer, Layer, OutputLayer, SoftmaxOutputLayer};
use crate::dtype::DTypeFloat;
use crate::error::Result;
use crate::matrix::Matrix;
use std::fmt::{Debug, Formatter};

/// Closed set of layer kinds a [`Network`](crate::net::Network) can hold.
#[derive(Clone)]
pub enum ConcreteLayer<T> {
    Dense(DenseLayer<T>),
    SoftmaxOutput(SoftmaxOutputLayer<T>),
}

impl<T: DTypeFloat> ConcreteLayer<T> {
    fn inner(&self) -> &dyn Layer<T> {
        match self {
            ConcreteLayer::Dense(inner) => inner,
            ConcreteLayer::SoftmaxOutput(inner) => inner,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Layer<T> {
        match self {
            ConcreteLayer::Dense(inner) => inner,
            ConcreteLayer::SoftmaxOutput(inner) => inner,
        }
    }

    pub fn as_output(&self) -> Option<&dyn OutputLayer<T>> {
        match self {
            ConcreteLayer::Dense(_) => None,
            ConcreteLayer::SoftmaxOutput(inner) => Some(inner as &dyn OutputLayer<T>),
        }
    }

    #[inline]
    pub fn is_output(&self) -> bool {
        self.as_output().is_some()
    }
}

impl<T: DTypeFloat> Layer<T> for ConcreteLayer<T> {
    fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        self.inner_mut().forward(input)
    }

    fn backward(&mut self, gradient: &Matrix<T>) -> Result<Matrix<T>> {
        self.inner_mut().backward(gradient)
    }

    fn update(&mut self, weights: Matrix<T>, biases: Matrix<T>) -> Result<()> {
        self.inner_mut().update(weights, biases)
    }

    #[inline]
    fn input_size(&self) -> usize {
        self.inner().input_size()
    }

    #[inline]
    fn output_size(&self) -> usize {
        self.inner().output_size()
    }

    #[inline]
    fn dense(&self) -> &DenseLayer<T> {
        self.inner().dense()
    }

    #[inline]
    fn dense_mut(&mut self) -> &mut DenseLayer<T> {
        self.inner_mut().dense_mut()
    }
}

impl<T> From<DenseLayer<T>> for ConcreteLayer<T> {
    fn from(layer: DenseLayer<T>) -> Self {
        ConcreteLayer::Dense(layer)
    }
}

impl<T> From<SoftmaxOutputLayer<T>> for ConcreteLayer<T> {
    fn from(layer: SoftmaxOutputLayer<T>) -> Self {
        ConcreteLayer::SoftmaxOutput(layer)
    }
}

impl<T> Debug for ConcreteLayer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcreteLayer::Dense(inner) => Debug::fmt(inner, f),
            ConcreteLayer::SoftmaxOutput(inner) => Debug::fmt(inner, f),
        }
    }
}
