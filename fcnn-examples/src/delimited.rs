use csv::{ReaderBuilder, Trim, WriterBuilder};
use fcnn::io::{MatrixReader, MatrixWriter};
use fcnn::matrix::Matrix;
use fcnn::scoring::argmax_columns;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum CsvError {
    NotFound {
        path: PathBuf,
    },
    Create {
        path: PathBuf,
        source: csv::Error,
    },
    Csv(csv::Error),
    Parse {
        line: u64,
        cell: String,
        message: String,
    },
    InconsistentColumns {
        line: u64,
        found: usize,
        expected: usize,
    },
    Matrix(fcnn::Error),
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

impl Display for CsvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvError::NotFound { path } => write!(
                f,
                "File <{}> was not found or access denied.",
                path.display()
            ),
            CsvError::Create { path, source } => write!(
                f,
                "File <{}> failed to open for writing. Details: <{source}>.",
                path.display()
            ),
            CsvError::Csv(err) => write!(f, "I/O error while processing delimited data: {err}"),
            CsvError::Parse {
                line,
                cell,
                message,
            } => write!(
                f,
                "Error while parsing float in file at line <{line}>, cell value: <{cell}>! Details: <{message}>."
            ),
            CsvError::InconsistentColumns {
                line,
                found,
                expected,
            } => write!(
                f,
                "Inconsistent column count at line <{line}>. Found <{found}> columns, but expected <{expected}>!"
            ),
            CsvError::Matrix(err) => Display::fmt(err, f),
        }
    }
}

impl std::error::Error for CsvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CsvError::Create { source, .. } => Some(source),
            CsvError::Csv(err) => Some(err),
            CsvError::Matrix(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for CsvError {
    fn from(value: csv::Error) -> Self {
        CsvError::Csv(value)
    }
}

impl From<fcnn::Error> for CsvError {
    fn from(value: fcnn::Error) -> Self {
        CsvError::Matrix(value)
    }
}

/// Reads headerless delimited files of floats, one matrix row per line. Blank lines are
/// skipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CsvReader {
    delimiter: u8,
}

impl CsvReader {
    pub fn new() -> Self {
        Self::with_delimiter(b',')
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        CsvReader { delimiter }
    }

    #[inline]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixReader<f32> for CsvReader {
    type Error = CsvError;

    fn read(&self, path: &Path) -> Result<Matrix<f32>, CsvError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|_| CsvError::NotFound {
                path: absolute(path),
            })?;

        let mut data = Vec::new();
        let mut rows = 0;
        let mut cols = None;
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(rows as u64 + 1, |p| p.line());
            for cell in record.iter() {
                let value = cell.parse::<f32>().map_err(|e| CsvError::Parse {
                    line,
                    cell: cell.to_string(),
                    message: e.to_string(),
                })?;
                data.push(value);
            }
            match cols {
                None => cols = Some(record.len()),
                Some(expected) if expected != record.len() => {
                    return Err(CsvError::InconsistentColumns {
                        line,
                        found: record.len(),
                        expected,
                    });
                }
                Some(_) => {}
            }
            rows += 1;
        }
        Ok(Matrix::from_vec(rows, cols.unwrap_or(0), data)?)
    }
}

/// Writes the predicted class of every column, i.e. the row index of its maximum, one per
/// line.
#[derive(Copy, Clone, Debug, Default)]
pub struct LabelWriter;

impl MatrixWriter<f32> for LabelWriter {
    type Error = CsvError;

    fn write(&self, path: &Path, matrix: &Matrix<f32>) -> Result<(), CsvError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|source| CsvError::Create {
                path: absolute(path),
                source,
            })?;
        for class in argmax_columns(matrix) {
            writer.write_record([class.to_string()])?;
        }
        writer.flush().map_err(|e| CsvError::Csv(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_valid() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "8.589,48,-85.87,1.00001\n789568.589,48,-85,0\n");
        let m = CsvReader::new().read(&path).unwrap();
        assert_eq!(m.shape(), (2, 4));
        assert_abs_diff_eq!(m[(0, 0)], 8.589, epsilon = 1e-3);
        assert_abs_diff_eq!(m[(0, 2)], -85.87, epsilon = 1e-3);
        assert_abs_diff_eq!(m[(1, 0)], 789568.589, epsilon = 1e-1);
        assert_abs_diff_eq!(m[(1, 3)], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_read_semicolon() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "1;2\n\n3;4\n");
        let m = CsvReader::with_delimiter(b';').read(&path).unwrap();
        assert_eq!(m.to_row_major_vec(), vec![1., 2., 3., 4.]);
    }

    #[test]
    fn test_read_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", "");
        let m = CsvReader::new().read(&path).unwrap();
        assert_eq!(m.shape(), (0, 0));
    }

    #[test]
    fn test_read_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", "1,2\n3,abc\n");
        let err = CsvReader::new().read(&path).unwrap_err();
        assert!(matches!(err, CsvError::Parse { line: 2, ref cell, .. } if cell == "abc"));

        let path = write_file(&dir, "ragged.csv", "1,2\n3\n");
        let err = CsvReader::new().read(&path).unwrap_err();
        assert!(matches!(
            err,
            CsvError::InconsistentColumns {
                found: 1,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_read_missing() {
        let dir = TempDir::new().unwrap();
        let err = CsvReader::new().read(&dir.path().join("UNKNOWN.csv")).unwrap_err();
        assert!(matches!(err, CsvError::NotFound { .. }));
        assert!(err.to_string().contains("UNKNOWN.csv"));
    }

    #[test]
    fn test_write_labels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("predictions.csv");
        let predictions =
            Matrix::from_vec(3, 3, vec![0.1f32, 0.5, 0.2, 0.7, 0.5, 0.2, 0.2, 0.0, 0.6]).unwrap();
        LabelWriter.write(&path, &predictions).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n0\n2\n");
    }

    #[test]
    fn test_write_unwritable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("predictions.csv");
        let err = LabelWriter.write(&path, &Matrix::zeros(2, 1)).unwrap_err();
        assert!(err.to_string().contains("failed to open for writing"));
    }
}
