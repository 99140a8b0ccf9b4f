use crate::dtype::DType;
use crate::matrix::Matrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Variance scaling scheme used to draw initial weights.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitializerKind {
    /// `N(0, 2 / (fan_in + fan_out))`
    #[default]
    GlorotNormal,
    /// `N(0, 2 / fan_in)`
    HeNormal,
}

impl InitializerKind {
    pub fn std_dev(&self, fan_in: usize, fan_out: usize) -> f64 {
        match self {
            InitializerKind::GlorotNormal => (2.0 / (fan_in + fan_out) as f64).sqrt(),
            InitializerKind::HeNormal => (2.0 / fan_in as f64).sqrt(),
        }
    }
}

/// Seeded sampler of initial layer parameters. The generator state carries over between calls,
/// so consecutive layers drawn from one initializer get different weights.
#[derive(Clone, Debug)]
pub struct WeightInitializer {
    kind: InitializerKind,
    rng: StdRng,
}

impl WeightInitializer {
    pub fn seed_from_u64(kind: InitializerKind, seed: u64) -> Self {
        WeightInitializer {
            kind,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(kind: InitializerKind) -> Self {
        WeightInitializer {
            kind,
            rng: StdRng::from_entropy(),
        }
    }

    #[inline]
    pub fn kind(&self) -> InitializerKind {
        self.kind
    }

    /// Draws an `output_size x input_size` weight matrix.
    pub fn weights<T: DType>(&mut self, input_size: usize, output_size: usize) -> Matrix<T> {
        let std = if input_size == 0 {
            0.0
        } else {
            self.kind.std_dev(input_size, output_size)
        };
        let rng = &mut self.rng;
        Matrix::from_fn(output_size, input_size, |_, _| {
            let z: f64 = rng.sample(StandardNormal);
            T::from_f64(z * std)
        })
    }

    pub fn biases<T: DType>(&mut self, output_size: usize) -> Matrix<T> {
        Matrix::zeros(output_size, 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_same_seed_same_weights() {
        let mut a = WeightInitializer::seed_from_u64(InitializerKind::GlorotNormal, 42);
        let mut b = WeightInitializer::seed_from_u64(InitializerKind::GlorotNormal, 42);
        let wa: Matrix<f32> = a.weights(4, 3);
        let wb: Matrix<f32> = b.weights(4, 3);
        assert_eq!(wa.shape(), (3, 4));
        assert_eq!(wa, wb);
        let wa2: Matrix<f32> = a.weights(4, 3);
        assert_ne!(wa, wa2);
    }

    #[test]
    fn test_biases_are_zero() {
        let mut init = WeightInitializer::seed_from_u64(InitializerKind::HeNormal, 1);
        let b: Matrix<f64> = init.biases(5);
        assert_eq!(b, Matrix::zeros(5, 1));
    }

    #[test]
    fn test_std_dev() {
        assert!((InitializerKind::GlorotNormal.std_dev(3, 5) - 0.5).abs() < 1e-12);
        assert!((InitializerKind::HeNormal.std_dev(8, 100) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sample_spread() {
        let mut init = WeightInitializer::seed_from_u64(InitializerKind::HeNormal, 7);
        let w: Matrix<f64> = init.weights(200, 100);
        let n = w.len() as f64;
        let mean = w.sum() / n;
        let var = w.as_slice().iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        assert!(mean.abs() < 0.01);
        assert!((var.sqrt() - 0.1).abs() < 0.005);
    }
}
