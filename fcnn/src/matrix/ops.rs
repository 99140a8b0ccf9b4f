use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use std::iter::zip;
use std::ops::Range;

impl<T: DTypeFloat> Matrix<T> {
    fn check_same_shape(&self, other: &Self, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::mismatch(op, self.shape(), other.shape()));
        }
        Ok(())
    }

    fn zip_with<F>(&self, other: &Self, op: &'static str, f: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        self.check_same_shape(other, op)?;
        if self.transposed == other.transposed {
            let data = zip(&self.data, &other.data).map(|(&a, &b)| f(a, b)).collect();
            Ok(Matrix {
                rows: self.rows,
                cols: self.cols,
                transposed: self.transposed,
                data,
            })
        } else {
            Ok(Matrix::from_fn(self.rows, self.cols, |r, c| {
                f(self[(r, c)], other[(r, c)])
            }))
        }
    }

    fn zip_assign<F>(&mut self, other: &Self, op: &'static str, f: F) -> Result<()>
    where
        F: Fn(&mut T, T),
    {
        self.check_same_shape(other, op)?;
        if self.transposed == other.transposed {
            zip(&mut self.data, &other.data).for_each(|(a, &b)| f(a, b));
        } else {
            for r in 0..self.rows {
                for c in 0..self.cols {
                    f(&mut self[(r, c)], other[(r, c)]);
                }
            }
        }
        Ok(())
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.zip_assign(other, "add_assign", |a, b| *a += b)
    }

    pub fn sub_assign(&mut self, other: &Self) -> Result<()> {
        self.zip_assign(other, "sub_assign", |a, b| *a -= b)
    }

    pub fn hadamard_assign(&mut self, other: &Self) -> Result<()> {
        self.zip_assign(other, "hadamard_assign", |a, b| *a *= b)
    }

    pub fn scale(&self, scalar: T) -> Self {
        self.map(|v| v * scalar)
    }

    pub fn scale_in_place(&mut self, scalar: T) {
        self.map_in_place(|v| v * scalar)
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Applies `f` to every element. The result keeps the transpose flag.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            transposed: self.transposed,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn map_in_place<F>(&mut self, f: F)
    where
        F: Fn(T) -> T,
    {
        self.data.iter_mut().for_each(|v| *v = f(*v));
    }

    /// Matrix product on the multi-threaded GEMM kernel. Transposed operands are read through
    /// their strides, the product is always a fresh untransposed matrix.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::mismatch("matmul", self.shape(), other.shape()));
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut out = Matrix::zeros(m, n);
        if m == 0 || k == 0 || n == 0 {
            return Ok(out);
        }
        let (rsa, csa) = self.strides();
        let (rsb, csb) = other.strides();
        let (rsc, csc) = out.strides();
        // SAFETY: every operand buffer holds exactly rows * cols elements and the strides
        // address each logical element once; `out` is freshly allocated.
        unsafe {
            T::gemm(
                m,
                k,
                n,
                T::ONE,
                self.data.as_ptr(),
                rsa as isize,
                csa as isize,
                other.data.as_ptr(),
                rsb as isize,
                csb as isize,
                T::ZERO,
                out.data.as_mut_ptr(),
                rsc as isize,
                csc as isize,
            );
        }
        Ok(out)
    }

    /// Serial triple loop product, used as a reference for [`Matrix::matmul`].
    pub fn matmul_naive(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(Error::mismatch("matmul_naive", self.shape(), other.shape()));
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = T::ZERO;
                for k in 0..self.cols {
                    sum += self[(i, k)] * other[(k, j)];
                }
                out.data[i * other.cols + j] = sum;
            }
        }
        Ok(out)
    }

    /// Adds the `rows x 1` column vector to every column.
    pub fn add_to_all_cols(&mut self, vector: &Self) -> Result<()> {
        if vector.shape() != (self.rows, 1) {
            return Err(Error::mismatch("add_to_all_cols", self.shape(), vector.shape()));
        }
        for r in 0..self.rows {
            let v = vector[(r, 0)];
            for c in 0..self.cols {
                self[(r, c)] += v;
            }
        }
        Ok(())
    }

    /// Sums every row, producing a `rows x 1` column.
    pub fn sum_columns(&self) -> Self {
        Matrix::from_fn(self.rows, 1, |r, _| {
            (0..self.cols).fold(T::ZERO, |acc, c| acc + self[(r, c)])
        })
    }

    pub fn sum(&self) -> T {
        self.data.iter().fold(T::ZERO, |acc, &v| acc + v)
    }

    /// Copies the columns in `range` into a new untransposed matrix.
    pub fn get_columns(&self, range: Range<usize>) -> Result<Self> {
        if range.end > self.cols {
            return Err(Error::OutOfBounds {
                op: "get_columns",
                index: range.end,
                bound: self.cols,
            });
        }
        if range.start > range.end {
            return Err(Error::OutOfBounds {
                op: "get_columns",
                index: range.start,
                bound: range.end,
            });
        }
        Ok(self.copy_columns(range))
    }

    pub(crate) fn copy_columns(&self, range: Range<usize>) -> Self {
        debug_assert!(range.end <= self.cols);
        let start = range.start;
        Matrix::from_fn(self.rows, range.len(), |r, c| self[(r, start + c)])
    }

    /// Copies the given columns, in order, into a new untransposed matrix.
    pub fn select_columns(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.cols) {
            return Err(Error::OutOfBounds {
                op: "select_columns",
                index,
                bound: self.cols,
            });
        }
        Ok(self.gather_columns(indices))
    }

    pub(crate) fn gather_columns(&self, indices: &[usize]) -> Self {
        Matrix::from_fn(self.rows, indices.len(), |r, c| self[(r, indices[c])])
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::matrix::{Matrix, RandomConfig};

    macro_rules! assert_slice_equal {
        ($a:expr, $b:expr) => {{
            match (&$a, &$b) {
                (a, b) => {
                    if a.len() != b.len()
                        || !std::iter::zip(a.iter(), b.iter()).all(|(&i, &j)| (i - j).abs() <= 1e-4)
                    {
                        panic!("slices not equal: left={:?}, right={:?}", a, b);
                    }
                }
            }
        }};
    }

    fn mat(rows: usize, cols: usize, data: &[f32]) -> Matrix<f32> {
        Matrix::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn test_add_sub() {
        let a = mat(2, 2, &[1., 2., 3., 4.]);
        let b = mat(2, 2, &[0.5, 0.5, 1., 1.]);
        assert_slice_equal!(a.add(&b).unwrap().as_slice(), &[1.5, 2.5, 4., 5.]);
        assert_slice_equal!(a.sub(&b).unwrap().as_slice(), &[0.5, 1.5, 2., 3.]);
        let c = mat(1, 4, &[1., 2., 3., 4.]);
        assert_eq!(
            a.add(&c).unwrap_err(),
            Error::DimensionMismatch {
                op: "add",
                left: (2, 2),
                right: (1, 4)
            }
        );
    }

    #[test]
    fn test_add_mixed_layout() {
        let a = mat(2, 3, &[1., 2., 3., 4., 5., 6.]);
        let b = mat(3, 2, &[10., 40., 20., 50., 30., 60.]).into_transposed();
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.to_row_major_vec(), vec![11., 22., 33., 44., 55., 66.]);
        let mut c = b.clone();
        c.sub_assign(&a).unwrap();
        assert_eq!(c.to_row_major_vec(), vec![9., 18., 27., 36., 45., 54.]);
    }

    #[test]
    fn test_hadamard() {
        let a = mat(2, 2, &[1., 2., 3., 4.]);
        let b = mat(2, 2, &[2., 0., -1., 0.5]);
        assert_slice_equal!(a.hadamard(&b).unwrap().as_slice(), &[2., 0., -3., 2.]);
        assert!(a.hadamard(&mat(2, 1, &[1., 1.])).is_err());
    }

    #[test]
    fn test_matmul() {
        let a = mat(2, 3, &[1., 2., 3., 4., 5., 6.]);
        let b = mat(3, 2, &[7., 8., 9., 10., 11., 12.]);
        assert_slice_equal!(a.matmul(&b).unwrap().as_slice(), &[58., 64., 139., 154.]);
        assert_slice_equal!(
            b.matmul(&a).unwrap().as_slice(),
            &[39., 54., 69., 49., 68., 87., 59., 82., 105.]
        );
        assert!(a.matmul(&a).is_err());
    }

    #[test]
    fn test_matmul_transposed_operands() {
        let a = mat(3, 2, &[1., 4., 2., 5., 3., 6.]).into_transposed();
        let b = mat(2, 3, &[7., 9., 11., 8., 10., 12.]).into_transposed();
        let r = a.matmul(&b).unwrap();
        assert!(!r.is_transposed());
        assert_slice_equal!(r.as_slice(), &[58., 64., 139., 154.]);
        assert_eq!(r, a.matmul_naive(&b).unwrap());
    }

    #[test]
    fn test_matmul_matches_naive() {
        let a = Matrix::<f64>::random(17, 33, &RandomConfig { min: -1.0, max: 1.0, seed: 1 });
        let b = Matrix::<f64>::random(33, 9, &RandomConfig { min: -1.0, max: 1.0, seed: 2 });
        let fast = a.matmul(&b).unwrap();
        let slow = a.matmul_naive(&b).unwrap();
        assert_eq!(fast.shape(), (17, 9));
        for (x, y) in std::iter::zip(fast.as_slice(), slow.as_slice()) {
            assert!((x - y).abs() < 1e-9);
        }
        let bt = b.clone().into_transposed();
        let at = a.clone().into_transposed();
        let fast_t = bt.matmul(&at).unwrap();
        assert_eq!(fast_t.shape(), (9, 17));
        for r in 0..9 {
            for c in 0..17 {
                assert!((fast_t[(r, c)] - slow[(c, r)]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_map_keeps_flag() {
        let a = mat(2, 3, &[1., -2., 3., -4., 5., -6.]).into_transposed();
        let b = a.map(|v| v.abs());
        assert!(b.is_transposed());
        assert_eq!(b.to_row_major_vec(), vec![1., 4., 2., 5., 3., 6.]);
        let mut c = a.scale(2.0);
        c.scale_in_place(0.5);
        assert_eq!(c, a);
    }

    #[test]
    fn test_add_to_all_cols() {
        let mut a = mat(2, 3, &[1., 2., 3., 4., 5., 6.]);
        a.add_to_all_cols(&mat(2, 1, &[10., 20.])).unwrap();
        assert_slice_equal!(a.as_slice(), &[11., 12., 13., 24., 25., 26.]);
        assert!(a.add_to_all_cols(&mat(1, 2, &[1., 1.])).is_err());
        assert!(a.add_to_all_cols(&mat(3, 1, &[1., 1., 1.])).is_err());
    }

    #[test]
    fn test_sum_columns() {
        let a = mat(2, 3, &[1., 2., 3., 4., 5., 6.]);
        let s = a.sum_columns();
        assert_eq!(s.shape(), (2, 1));
        assert_slice_equal!(s.as_slice(), &[6., 15.]);
        let t = a.into_transposed().sum_columns();
        assert_eq!(t.shape(), (3, 1));
        assert_slice_equal!(t.as_slice(), &[5., 7., 9.]);
    }

    #[test]
    fn test_get_columns() {
        let a = mat(2, 4, &[1., 2., 3., 4., 5., 6., 7., 8.]);
        let cols = a.get_columns(1..3).unwrap();
        assert_eq!(cols.shape(), (2, 2));
        assert_slice_equal!(cols.as_slice(), &[2., 3., 6., 7.]);
        assert_eq!(a.get_columns(4..4).unwrap().shape(), (2, 0));
        assert_eq!(
            a.get_columns(2..5).unwrap_err(),
            Error::OutOfBounds {
                op: "get_columns",
                index: 5,
                bound: 4
            }
        );
        let t = a.into_transposed().get_columns(0..1).unwrap();
        assert!(!t.is_transposed());
        assert_slice_equal!(t.as_slice(), &[1., 2., 3., 4.]);
    }

    #[test]
    fn test_select_columns() {
        let a = mat(2, 4, &[1., 2., 3., 4., 5., 6., 7., 8.]);
        let s = a.select_columns(&[3, 0, 3]).unwrap();
        assert_slice_equal!(s.as_slice(), &[4., 1., 4., 8., 5., 8.]);
        assert!(a.select_columns(&[1, 4]).is_err());
    }
}
