use crate::dtype::DType;
use crate::error::{Error, Result};
use rand::SeedableRng;
use rand::distributions::{Distribution, Standard};
use rand::rngs::StdRng;
use std::ops::{Index, IndexMut};

#[cfg(feature = "approx")]
mod approx;
mod debug;
mod iter;
mod ops;

pub use iter::{ColMajorIter, RowMajorIter};

/// Parameters of [`Matrix::random`]. Values are drawn uniformly from `[min, max)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RandomConfig {
    pub min: f64,
    pub max: f64,
    pub seed: u64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        RandomConfig {
            min: 0.0,
            max: 1.0,
            seed: 42,
        }
    }
}

/// Dense two dimensional matrix.
///
/// Elements are stored contiguously in a single buffer. The matrix carries a transpose flag so
/// that [`Matrix::transpose`] never moves data; `rows` and `cols` always describe the logical
/// shape and every element lookup goes through [`Matrix::strides`].
#[derive(Clone)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    transposed: bool,
    data: Vec<T>,
}

impl<T: DType> Matrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Matrix {
            rows,
            cols,
            transposed: false,
            data: vec![value; rows * cols],
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::ZERO)
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::ONE)
    }

    pub fn identity(side: usize) -> Self {
        let mut m = Self::zeros(side, side);
        for i in 0..side {
            m.data[i * side + i] = T::ONE;
        }
        m
    }

    /// Builds a matrix from row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::Construction {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Matrix {
            rows,
            cols,
            transposed: false,
            data,
        })
    }

    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Matrix {
            rows,
            cols,
            transposed: false,
            data,
        }
    }

    pub fn random(rows: usize, cols: usize, config: &RandomConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let span = config.max - config.min;
        let data = Standard
            .sample_iter(&mut rng)
            .take(rows * cols)
            .map(|u: f64| T::from_f64(config.min + span * u))
            .collect();
        Matrix {
            rows,
            cols,
            transposed: false,
            data,
        }
    }
}

impl<T> Matrix<T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    /// Row and column stride of the logical layout over the backing buffer.
    #[inline]
    pub fn strides(&self) -> (usize, usize) {
        if self.transposed {
            (1, self.rows)
        } else {
            (self.cols, 1)
        }
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        let (rs, cs) = self.strides();
        row * rs + col * cs
    }

    /// Swaps the logical dimensions in O(1).
    pub fn transpose(&mut self) {
        self.transposed = !self.transposed;
        std::mem::swap(&mut self.rows, &mut self.cols);
    }

    pub fn into_transposed(mut self) -> Self {
        self.transpose();
        self
    }

    /// Raw backing buffer in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = self.offset(row, col);
        self.data.get_mut(idx)
    }

    pub fn row_major_iter(&self) -> RowMajorIter<'_, T> {
        RowMajorIter::new(self)
    }

    pub fn col_major_iter(&self) -> ColMajorIter<'_, T> {
        ColMajorIter::new(self)
    }
}

impl<T: Copy> Matrix<T> {
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(self.offset(row, col)).copied()
    }

    /// Stores `value` at the given position, returning `false` when it is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.get_mut(row, col) {
            Some(el) => {
                *el = value;
                true
            }
            None => false,
        }
    }

    /// Copies the logical contents into row-major order.
    pub fn to_row_major_vec(&self) -> Vec<T> {
        self.row_major_iter().collect()
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        &self.data[self.offset(row, col)]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        debug_assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        let idx = self.offset(row, col);
        &mut self.data[idx]
    }
}

impl<T: PartialEq> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        if self.transposed == other.transposed {
            return self.data == other.data;
        }
        (0..self.rows).all(|r| (0..self.cols).all(|c| self[(r, c)] == other[(r, c)]))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_vec_len_mismatch() {
        let r = Matrix::<f32>::from_vec(2, 3, vec![1.0; 5]);
        assert_eq!(
            r.unwrap_err(),
            Error::Construction {
                rows: 2,
                cols: 3,
                len: 5
            }
        );
    }

    #[test]
    fn test_identity() {
        let m = Matrix::<f64>::identity(3);
        assert_eq!(m.as_slice(), &[1., 0., 0., 0., 1., 0., 0., 0., 1.]);
    }

    #[test]
    fn test_transposed_indexing() {
        let mut m = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]).unwrap();
        m.transpose();
        assert_eq!(m.shape(), (3, 2));
        assert!(m.is_transposed());
        assert_eq!(m[(0, 1)], 4.0);
        assert_eq!(m[(2, 0)], 3.0);
        assert_eq!(m.get(1, 1), Some(5.0));
        assert_eq!(m.get(2, 2), None);
        assert_eq!(m.to_row_major_vec(), vec![1., 4., 2., 5., 3., 6.]);
    }

    #[test]
    fn test_double_transpose() {
        let original = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]).unwrap();
        let m = original.clone().into_transposed().into_transposed();
        assert!(!m.is_transposed());
        assert_eq!(m, original);
        let sum = m.add(&original).unwrap();
        assert_eq!(sum.as_slice(), &[2., 4., 6., 8., 10., 12.]);
    }

    #[test]
    fn test_set() {
        let mut m = Matrix::<f32>::zeros(2, 2);
        assert!(m.set(1, 0, 7.0));
        assert!(!m.set(2, 0, 7.0));
        assert_eq!(m[(1, 0)], 7.0);
        m.transpose();
        assert!(m.set(1, 0, 3.0));
        assert_eq!(m.as_slice(), &[0.0, 3.0, 7.0, 0.0]);
    }

    #[test]
    fn test_equality_ignores_layout() {
        let a = Matrix::from_vec(2, 2, vec![1., 3., 2., 4.]).unwrap();
        let b = Matrix::from_vec(2, 2, vec![1., 2., 3., 4.]).unwrap().into_transposed();
        assert_eq!(a, b);
        let c = Matrix::from_vec(1, 4, vec![1., 3., 2., 4.]).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_is_seeded() {
        let config = RandomConfig {
            min: -2.0,
            max: 3.0,
            seed: 7,
        };
        let a = Matrix::<f32>::random(4, 5, &config);
        let b = Matrix::<f32>::random(4, 5, &config);
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|&v| (-2.0..=3.0).contains(&v)));
        let c = Matrix::<f32>::random(4, 5, &RandomConfig { seed: 8, ..config });
        assert_ne!(a, c);
    }
}
