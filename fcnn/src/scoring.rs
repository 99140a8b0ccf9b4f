use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use std::fmt::{Display, Formatter};

/// Row index of the first maximum of every column. Columns without a comparable value map to
/// row 0.
pub fn argmax_columns<T: DTypeFloat>(m: &Matrix<T>) -> Vec<usize> {
    (0..m.cols())
        .map(|col| {
            let mut best = T::neg_infinity();
            let mut best_row = 0;
            for row in 0..m.rows() {
                let v = m[(row, col)];
                if v > best {
                    best = v;
                    best_row = row;
                }
            }
            best_row
        })
        .collect()
}

/// Outcome of classifying column-per-example predictions against one-hot labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub total: usize,
    pub correct: usize,
    /// `confusion[actual][predicted]` example counts.
    pub confusion: Vec<Vec<usize>>,
}

impl Evaluation {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }

    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.accuracy()
    }

    #[inline]
    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Confusion matrix (rows: actual, columns: predicted):")?;
        for row in &self.confusion {
            let cells: Vec<String> = row.iter().map(|c| format!("{c:>6}")).collect();
            writeln!(f, "  [{}]", cells.join(","))?;
        }
        writeln!(
            f,
            "Correctly classified: {:.2}% ({}/{})",
            self.accuracy() * 100.0,
            self.correct,
            self.total
        )?;
        write!(
            f,
            "Error rate: {:.2}% ({}/{})",
            self.error_rate() * 100.0,
            self.incorrect(),
            self.total
        )
    }
}

/// Scores `predictions` against one-hot `labels` of the same shape. An example counts as correct
/// when its label is 1 at the predicted class.
pub fn evaluate<T: DTypeFloat>(predictions: &Matrix<T>, labels: &Matrix<T>) -> Result<Evaluation> {
    if predictions.shape() != labels.shape() {
        return Err(Error::mismatch("evaluate", predictions.shape(), labels.shape()));
    }
    let classes = predictions.rows();
    let predicted = argmax_columns(predictions);
    let actual = argmax_columns(labels);
    let mut confusion = vec![vec![0; classes]; classes];
    let mut correct = 0;
    for (col, (&p, &a)) in predicted.iter().zip(&actual).enumerate() {
        if classes == 0 {
            break;
        }
        if labels[(p, col)] == T::ONE {
            correct += 1;
        }
        confusion[a][p] += 1;
    }
    Ok(Evaluation {
        total: predictions.cols(),
        correct,
        confusion,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_argmax_first_maximum() {
        let m = Matrix::from_vec(3, 3, vec![0.1f32, 0.5, 0.2, 0.7, 0.5, 0.2, 0.2, 0.0, 0.6]).unwrap();
        assert_eq!(argmax_columns(&m), vec![1, 0, 2]);
        let t = m.into_transposed();
        assert_eq!(argmax_columns(&t), vec![1, 0, 2]);
    }

    #[test]
    fn test_evaluate() {
        let predictions =
            Matrix::from_vec(2, 4, vec![0.9f32, 0.2, 0.4, 0.3, 0.1, 0.8, 0.6, 0.7]).unwrap();
        let labels = Matrix::from_vec(2, 4, vec![1.0f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0]).unwrap();
        let eval = evaluate(&predictions, &labels).unwrap();
        assert_eq!(eval.total, 4);
        assert_eq!(eval.correct, 3);
        assert_eq!(eval.confusion, vec![vec![1, 1], vec![0, 2]]);
        assert!((eval.accuracy() - 0.75).abs() < 1e-12);
        assert!(eval.to_string().ends_with("Error rate: 25.00% (1/4)"));
    }

    #[test]
    fn test_evaluate_shape_mismatch() {
        let a = Matrix::<f64>::zeros(2, 3);
        let b = Matrix::<f64>::zeros(3, 2);
        assert!(evaluate(&a, &b).is_err());
    }
}
