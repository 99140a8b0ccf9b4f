use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::Matrix;

pub const DEFAULT_LEAKY_RELU_ALPHA: f64 = 0.05;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationFn {
    #[default]
    ReLU,
    LeakyReLU {
        alpha: f64,
    },
    /// Column-wise softmax. Only usable as the activation of an output layer paired with
    /// cross-entropy loss, since it has no standalone derivative.
    Softmax,
}

impl ActivationFn {
    pub fn leaky_relu() -> Self {
        ActivationFn::LeakyReLU {
            alpha: DEFAULT_LEAKY_RELU_ALPHA,
        }
    }

    /// Replaces every pre-activation in `m` with its activation.
    pub fn compute<T: DTypeFloat>(&self, m: &mut Matrix<T>) -> Result<()> {
        match *self {
            ActivationFn::ReLU => {
                m.map_in_place(|x| if x > T::ZERO { x } else { T::ZERO });
                Ok(())
            }
            ActivationFn::LeakyReLU { alpha } => {
                let alpha = T::from_f64(alpha);
                m.map_in_place(|x| if x > T::ZERO { x } else { x * alpha });
                Ok(())
            }
            ActivationFn::Softmax => softmax(m),
        }
    }

    /// Replaces every pre-activation in `m` with the activation's derivative at that point.
    pub fn derivative<T: DTypeFloat>(&self, m: &mut Matrix<T>) -> Result<()> {
        match *self {
            ActivationFn::ReLU => {
                m.map_in_place(|x| if x > T::ZERO { T::ONE } else { T::ZERO });
                Ok(())
            }
            ActivationFn::LeakyReLU { alpha } => {
                let alpha = T::from_f64(alpha);
                m.map_in_place(|x| if x > T::ZERO { T::ONE } else { alpha });
                Ok(())
            }
            ActivationFn::Softmax => Err(Error::Unsupported(
                "softmax derivative outside of a softmax cross-entropy output layer",
            )),
        }
    }
}

fn softmax<T: DTypeFloat>(m: &mut Matrix<T>) -> Result<()> {
    let rows = m.rows();
    if rows == 0 {
        return Ok(());
    }
    for col in 0..m.cols() {
        let max = (1..rows).fold(m[(0, col)], |acc, row| acc.max(m[(row, col)]));
        let mut sum = T::ZERO;
        for row in 0..rows {
            let e = (m[(row, col)] - max).exp();
            m[(row, col)] = e;
            sum += e;
        }
        if sum == T::ZERO || !sum.is_finite() {
            return Err(Error::Numerical("softmax exponential sum is not a positive finite value"));
        }
        let recip = T::ONE / sum;
        for row in 0..rows {
            m[(row, col)] *= recip;
        }
    }
    Ok(())
}
