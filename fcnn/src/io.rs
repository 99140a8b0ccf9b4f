use crate::data::{DatasetParams, TrainingDataset};
use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use log::debug;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Source of matrices stored one example per row.
pub trait MatrixReader<T> {
    type Error: Display;

    fn read(&self, path: &Path) -> std::result::Result<Matrix<T>, Self::Error>;
}

pub trait MatrixWriter<T> {
    type Error: Display;

    fn write(&self, path: &Path, matrix: &Matrix<T>) -> std::result::Result<(), Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetPaths {
    pub training_features: PathBuf,
    pub training_labels: PathBuf,
    pub testing_features: PathBuf,
    pub testing_labels: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadingParams {
    /// Number of classes, the row count of one-hot encoded labels.
    pub class_count: usize,
    /// Expands single-column label files of class indices into one-hot columns.
    pub one_hot_encode: bool,
    /// Every feature value is divided by this factor.
    pub normalization_factor: f64,
}

impl Default for LoadingParams {
    fn default() -> Self {
        LoadingParams {
            class_count: 2,
            one_hot_encode: false,
            normalization_factor: 1.0,
        }
    }
}

/// Training dataset plus the held out test set, all one example per column.
#[derive(Clone, Debug)]
pub struct LoadedDataset<T> {
    pub training: TrainingDataset<T>,
    pub testing_features: Matrix<T>,
    pub testing_labels: Matrix<T>,
}

fn read_examples<T, R>(reader: &R, path: &Path) -> Result<Matrix<T>>
where
    T: DTypeFloat,
    R: MatrixReader<T>,
{
    let matrix = reader.read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(
        "read {} examples of {} values from <{}>",
        matrix.rows(),
        matrix.cols(),
        path.display()
    );
    Ok(matrix.into_transposed())
}

/// Writes `matrix` through `writer`, reporting failures as [`Error::Write`].
pub fn write_matrix<T, W>(writer: &W, path: &Path, matrix: &Matrix<T>) -> Result<()>
where
    W: MatrixWriter<T>,
{
    writer.write(path, matrix).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!("wrote {} columns to <{}>", matrix.cols(), path.display());
    Ok(())
}

fn normalize<T: DTypeFloat>(features: Matrix<T>, factor: f64) -> Matrix<T> {
    if factor == 1.0 {
        return features;
    }
    let recip = T::from_f64(1.0 / factor);
    features.map(|v| v * recip)
}

/// Expands a `1 x n` row of class indices into a `class_count x n` one-hot matrix.
pub fn one_hot_encode<T: DTypeFloat>(labels: &Matrix<T>, class_count: usize) -> Result<Matrix<T>> {
    if labels.rows() != 1 {
        return Err(Error::mismatch("one_hot_encode", labels.shape(), (1, labels.cols())));
    }
    let mut encoded = Matrix::zeros(class_count, labels.cols());
    for example in 0..labels.cols() {
        let value = labels[(0, example)];
        let class = value.as_f64();
        if class < 0.0 || class.fract() != 0.0 || class >= class_count as f64 {
            return Err(Error::InvalidLabel {
                example,
                value: class,
            });
        }
        encoded[(class as usize, example)] = T::ONE;
    }
    Ok(encoded)
}

fn prepare_labels<T: DTypeFloat>(labels: Matrix<T>, params: &LoadingParams) -> Result<Matrix<T>> {
    if params.one_hot_encode {
        one_hot_encode(&labels, params.class_count)
    } else {
        Ok(labels)
    }
}

/// Reads the four dataset files, converts them to the column-per-example layout, normalizes
/// the features and optionally one-hot encodes the labels.
pub fn load_dataset<T, R>(
    reader: &R,
    paths: &DatasetPaths,
    dataset_params: DatasetParams,
    params: LoadingParams,
) -> Result<LoadedDataset<T>>
where
    T: DTypeFloat,
    R: MatrixReader<T>,
{
    if !(params.normalization_factor.is_finite() && params.normalization_factor != 0.0) {
        return Err(Error::InvalidParameter(format!(
            "normalization factor {} must be finite and non-zero",
            params.normalization_factor
        )));
    }
    let training_features = read_examples(reader, &paths.training_features)?;
    let training_labels = read_examples(reader, &paths.training_labels)?;
    let testing_features = read_examples(reader, &paths.testing_features)?;
    let testing_labels = read_examples(reader, &paths.testing_labels)?;

    let training = TrainingDataset::new(
        normalize(training_features, params.normalization_factor),
        prepare_labels(training_labels, &params)?,
        dataset_params,
    )?;
    let testing_features = normalize(testing_features, params.normalization_factor);
    let testing_labels = prepare_labels(testing_labels, &params)?;
    if testing_features.cols() != testing_labels.cols() {
        return Err(Error::mismatch(
            "load_dataset",
            testing_features.shape(),
            testing_labels.shape(),
        ));
    }
    Ok(LoadedDataset {
        training,
        testing_features,
        testing_labels,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    struct MemoryReader(HashMap<PathBuf, Matrix<f32>>);

    impl MatrixReader<f32> for MemoryReader {
        type Error = String;

        fn read(&self, path: &Path) -> std::result::Result<Matrix<f32>, String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| format!("no such file: {}", path.display()))
        }
    }

    struct FailingWriter;

    impl MatrixWriter<f32> for FailingWriter {
        type Error = &'static str;

        fn write(&self, _: &Path, _: &Matrix<f32>) -> std::result::Result<(), &'static str> {
            Err("disk full")
        }
    }

    fn paths() -> DatasetPaths {
        DatasetPaths {
            training_features: "train_x".into(),
            training_labels: "train_y".into(),
            testing_features: "test_x".into(),
            testing_labels: "test_y".into(),
        }
    }

    fn reader() -> MemoryReader {
        let mut files = HashMap::new();
        // four training examples with two features each
        files.insert(
            PathBuf::from("train_x"),
            Matrix::from_vec(4, 2, vec![0., 255., 51., 102., 255., 0., 0., 0.]).unwrap(),
        );
        files.insert(PathBuf::from("train_y"), Matrix::from_vec(4, 1, vec![0., 2., 1., 0.]).unwrap());
        files.insert(PathBuf::from("test_x"), Matrix::from_vec(1, 2, vec![255., 255.]).unwrap());
        files.insert(PathBuf::from("test_y"), Matrix::from_vec(1, 1, vec![1.]).unwrap());
        MemoryReader(files)
    }

    #[test]
    fn test_load_dataset() {
        let loaded = load_dataset(
            &reader(),
            &paths(),
            DatasetParams {
                batch_size: 2,
                validation_fraction: 0.0,
            },
            LoadingParams {
                class_count: 3,
                one_hot_encode: true,
                normalization_factor: 255.0,
            },
        )
        .unwrap();
        let features = loaded.training.features();
        assert_eq!(features.shape(), (2, 4));
        assert!((features[(1, 0)] - 1.0).abs() < 1e-6);
        assert!((features[(0, 1)] - 0.2).abs() < 1e-6);
        let labels = loaded.training.labels();
        assert_eq!(labels.shape(), (3, 4));
        assert_eq!(
            labels.to_row_major_vec(),
            vec![1., 0., 0., 1., 0., 0., 1., 0., 0., 1., 0., 0.]
        );
        assert_eq!(loaded.testing_features.shape(), (2, 1));
        assert_eq!(loaded.testing_labels.as_slice(), &[0., 1., 0.]);
    }

    #[test]
    fn test_missing_file() {
        let mut r = reader();
        r.0.remove(&PathBuf::from("test_y"));
        let err = load_dataset(&r, &paths(), DatasetParams::default(), LoadingParams::default())
            .unwrap_err();
        assert!(matches!(err, Error::Read { ref path, .. } if path == Path::new("test_y")));
    }

    #[test]
    fn test_invalid_label() {
        let labels = Matrix::from_vec(1, 3, vec![0.0f32, 3.0, 1.0]).unwrap();
        assert_eq!(
            one_hot_encode(&labels, 3).unwrap_err(),
            Error::InvalidLabel {
                example: 1,
                value: 3.0
            }
        );
        let labels = Matrix::from_vec(1, 1, vec![0.5f32]).unwrap();
        assert!(one_hot_encode(&labels, 3).is_err());
    }

    #[test]
    fn test_labels_without_encoding() {
        let loaded = load_dataset(
            &reader(),
            &paths(),
            DatasetParams {
                batch_size: 4,
                validation_fraction: 0.0,
            },
            LoadingParams::default(),
        )
        .unwrap();
        assert_eq!(loaded.training.labels().shape(), (1, 4));
        assert_eq!(loaded.training.batch_count(), 1);
    }

    #[test]
    fn test_write_failure() {
        let err = write_matrix(&FailingWriter, Path::new("out.csv"), &Matrix::zeros(2, 2))
            .unwrap_err();
        assert_eq!(
            err,
            Error::Write {
                path: PathBuf::from("out.csv"),
                message: "disk full".into()
            }
        );
    }
}
