use crate::matrix::Matrix;
use std::iter::FusedIterator;

/// Visits the logical elements of a matrix row after row.
pub struct RowMajorIter<'a, T> {
    matrix: &'a Matrix<T>,
    row: usize,
    col: usize,
}

impl<'a, T> RowMajorIter<'a, T> {
    pub(super) fn new(matrix: &'a Matrix<T>) -> Self {
        RowMajorIter {
            matrix,
            row: 0,
            col: 0,
        }
    }

    fn remaining(&self) -> usize {
        let (rows, cols) = self.matrix.shape();
        if self.row >= rows {
            0
        } else {
            (rows - self.row) * cols - self.col
        }
    }
}

impl<'a, T: Copy> Iterator for RowMajorIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let (rows, cols) = self.matrix.shape();
        if self.row >= rows || cols == 0 {
            return None;
        }
        let el = self.matrix[(self.row, self.col)];
        self.col += 1;
        if self.col == cols {
            self.col = 0;
            self.row += 1;
        }
        Some(el)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<'a, T: Copy> ExactSizeIterator for RowMajorIter<'a, T> {}
impl<'a, T: Copy> FusedIterator for RowMajorIter<'a, T> {}

/// Visits the logical elements of a matrix column after column.
pub struct ColMajorIter<'a, T> {
    matrix: &'a Matrix<T>,
    row: usize,
    col: usize,
}

impl<'a, T> ColMajorIter<'a, T> {
    pub(super) fn new(matrix: &'a Matrix<T>) -> Self {
        ColMajorIter {
            matrix,
            row: 0,
            col: 0,
        }
    }

    fn remaining(&self) -> usize {
        let (rows, cols) = self.matrix.shape();
        if self.col >= cols {
            0
        } else {
            (cols - self.col) * rows - self.row
        }
    }
}

impl<'a, T: Copy> Iterator for ColMajorIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let (rows, cols) = self.matrix.shape();
        if self.col >= cols || rows == 0 {
            return None;
        }
        let el = self.matrix[(self.row, self.col)];
        self.row += 1;
        if self.row == rows {
            self.row = 0;
            self.col += 1;
        }
        Some(el)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<'a, T: Copy> ExactSizeIterator for ColMajorIter<'a, T> {}
impl<'a, T: Copy> FusedIterator for ColMajorIter<'a, T> {}

#[cfg(test)]
mod test {
    use crate::matrix::Matrix;

    #[test]
    fn test_row_major() {
        let m = Matrix::<f32>::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]).unwrap();
        let it = m.row_major_iter();
        assert_eq!(it.len(), 6);
        assert_eq!(it.collect::<Vec<_>>(), vec![1., 2., 3., 4., 5., 6.]);
    }

    #[test]
    fn test_col_major_transposed() {
        let m = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]).unwrap().into_transposed();
        // logical 3x2: [[1, 4], [2, 5], [3, 6]]
        assert_eq!(m.col_major_iter().collect::<Vec<f64>>(), vec![1., 2., 3., 4., 5., 6.]);
        assert_eq!(m.row_major_iter().collect::<Vec<f64>>(), vec![1., 4., 2., 5., 3., 6.]);
    }

    #[test]
    fn test_empty() {
        let m = Matrix::<f32>::zeros(3, 0);
        assert_eq!(m.row_major_iter().count(), 0);
        assert_eq!(m.col_major_iter().len(), 0);
    }
}
