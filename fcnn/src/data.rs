use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetParams {
    pub batch_size: usize,
    /// Share of the examples held out for validation, in `[0, 1]`.
    pub validation_fraction: f64,
}

impl Default for DatasetParams {
    fn default() -> Self {
        DatasetParams {
            batch_size: 64,
            validation_fraction: 0.25,
        }
    }
}

/// Feature and label matrices (one example per column) split into a training partition and a
/// trailing validation partition.
///
/// The validation partition holds `floor(fraction * n / batch_size)` whole batches plus the
/// examples left over after cutting the dataset into batches, so the training partition
/// always divides evenly into batches.
#[derive(Clone, Debug)]
pub struct TrainingDataset<T> {
    features: Matrix<T>,
    labels: Matrix<T>,
    params: DatasetParams,
    training_size: usize,
    validation_size: usize,
    batch_count: usize,
}

impl<T: DTypeFloat> TrainingDataset<T> {
    pub fn new(features: Matrix<T>, labels: Matrix<T>, params: DatasetParams) -> Result<Self> {
        if features.cols() != labels.cols() {
            return Err(Error::mismatch("dataset", features.shape(), labels.shape()));
        }
        if params.batch_size == 0 {
            return Err(Error::InvalidParameter("batch size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&params.validation_fraction) {
            return Err(Error::InvalidParameter(format!(
                "validation fraction {} is outside of [0, 1]",
                params.validation_fraction
            )));
        }
        let dataset_size = features.cols();
        let batch_size = params.batch_size;
        let validation_batch_count =
            (params.validation_fraction * dataset_size as f64 / batch_size as f64) as usize;
        let residue = dataset_size - (dataset_size / batch_size) * batch_size;
        let validation_size = validation_batch_count * batch_size + residue;
        let training_size = dataset_size - validation_size;
        Ok(TrainingDataset {
            features,
            labels,
            params,
            training_size,
            validation_size,
            batch_count: training_size / batch_size,
        })
    }

    #[inline]
    pub fn dataset_size(&self) -> usize {
        self.features.cols()
    }

    #[inline]
    pub fn training_size(&self) -> usize {
        self.training_size
    }

    #[inline]
    pub fn validation_size(&self) -> usize {
        self.validation_size
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.params.batch_size
    }

    /// Number of whole batches in the training partition.
    #[inline]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    #[inline]
    pub fn params(&self) -> &DatasetParams {
        &self.params
    }

    #[inline]
    pub fn has_validation_set(&self) -> bool {
        self.validation_size > 0
    }

    #[inline]
    pub fn features(&self) -> &Matrix<T> {
        &self.features
    }

    #[inline]
    pub fn labels(&self) -> &Matrix<T> {
        &self.labels
    }

    pub fn training_features(&self) -> Matrix<T> {
        self.features.copy_columns(0..self.training_size)
    }

    pub fn training_labels(&self) -> Matrix<T> {
        self.labels.copy_columns(0..self.training_size)
    }

    pub fn validation_features(&self) -> Matrix<T> {
        self.features.copy_columns(self.training_size..self.dataset_size())
    }

    pub fn validation_labels(&self) -> Matrix<T> {
        self.labels.copy_columns(self.training_size..self.dataset_size())
    }

    pub(crate) fn batch_at(&self, index: usize) -> TrainingBatch<T> {
        let start = index * self.params.batch_size;
        let range = start..start + self.params.batch_size;
        TrainingBatch {
            features: self.features.copy_columns(range.clone()),
            labels: self.labels.copy_columns(range),
        }
    }

    pub(crate) fn batch_of(&self, indices: &[usize]) -> TrainingBatch<T> {
        TrainingBatch {
            features: self.features.gather_columns(indices),
            labels: self.labels.gather_columns(indices),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingBatch<T> {
    pub features: Matrix<T>,
    pub labels: Matrix<T>,
}

impl<T> TrainingBatch<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.features.cols()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.cols() == 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchGeneratorParams {
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for BatchGeneratorParams {
    fn default() -> Self {
        BatchGeneratorParams {
            shuffle: true,
            seed: 42,
        }
    }
}

/// Hands out the training partition of a [`TrainingDataset`] one batch at a time.
///
/// With shuffling enabled the batches are drawn through a permutation of the training indices,
/// reshuffled on every [`reset`](TrainingBatchGenerator::reset) by the same seeded generator,
/// so the whole sequence of epochs is reproducible from the seed.
#[derive(Debug)]
pub struct TrainingBatchGenerator<'a, T> {
    dataset: &'a TrainingDataset<T>,
    indices: Option<Vec<usize>>,
    rng: StdRng,
    cursor: usize,
}

impl<'a, T: DTypeFloat> TrainingBatchGenerator<'a, T> {
    pub fn new(dataset: &'a TrainingDataset<T>, params: BatchGeneratorParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let indices = params.shuffle.then(|| {
            let mut indices: Vec<usize> = (0..dataset.training_size()).collect();
            indices.shuffle(&mut rng);
            indices
        });
        TrainingBatchGenerator {
            dataset,
            indices,
            rng,
            cursor: 0,
        }
    }

    #[inline]
    pub fn has_next_batch(&self) -> bool {
        self.cursor < self.dataset.batch_count()
    }

    pub fn next_batch(&mut self) -> Option<TrainingBatch<T>> {
        if !self.has_next_batch() {
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;
        let batch = match &self.indices {
            None => self.dataset.batch_at(index),
            Some(indices) => {
                let batch_size = self.dataset.batch_size();
                let start = index * batch_size;
                self.dataset.batch_of(&indices[start..start + batch_size])
            }
        };
        Some(batch)
    }

    /// Rewinds to the first batch, reshuffling when shuffling is enabled.
    pub fn reset(&mut self) {
        self.cursor = 0;
        if let Some(indices) = self.indices.as_mut() {
            indices.shuffle(&mut self.rng);
        }
    }

    /// Current permutation of the training indices, if shuffling.
    pub fn indices(&self) -> Option<&[usize]> {
        self.indices.as_deref()
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<'a, T: DTypeFloat> Iterator for TrainingBatchGenerator<'a, T> {
    type Item = TrainingBatch<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.dataset.batch_count() - self.cursor;
        (n, Some(n))
    }
}
