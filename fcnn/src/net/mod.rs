use crate::activation::ActivationFn;
use crate::data::{BatchGeneratorParams, TrainingBatch, TrainingBatchGenerator, TrainingDataset};
use crate::dtype::DTypeFloat;
use crate::error::{Error, Result};
use crate::loss::LossFn;
use crate::matrix::Matrix;
use crate::net::initializer::{InitializerKind, WeightInitializer};
use crate::net::layer::{ConcreteLayer, DenseLayer, Layer, SoftmaxOutputLayer};
use crate::scoring;
use log::{debug, info, trace, warn, Level};
use std::fmt::{Debug, Display, Formatter};

pub mod initializer;
pub mod layer;

/// Optimizer and training loop settings.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HyperParameters {
    pub learning_rate: f64,
    /// Multiplies the learning rate at the end of every epoch.
    pub learning_rate_decay: f64,
    /// Weight retention coefficient: every update scales the weights by
    /// `1 - learning_rate * (1 - weight_decay)`, so `1.0` disables decay.
    pub weight_decay: f64,
    pub momentum: f64,
    pub epochs: usize,
    pub seed: u64,
    /// Fails the update with [`Error::Diverged`] when a weight leaves `[-bound, bound]` or is
    /// not finite.
    pub max_weight_magnitude: Option<f64>,
}

impl Default for HyperParameters {
    fn default() -> Self {
        HyperParameters {
            learning_rate: 0.001,
            learning_rate_decay: 1.0,
            weight_decay: 1.0,
            momentum: 0.0,
            epochs: 30,
            seed: 42,
            max_weight_magnitude: None,
        }
    }
}

impl HyperParameters {
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(Error::InvalidParameter(msg))
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return invalid(format!("learning rate {} must be finite and non-negative", self.learning_rate));
        }
        if !self.learning_rate_decay.is_finite() || self.learning_rate_decay <= 0.0 {
            return invalid(format!("learning rate decay {} must be positive", self.learning_rate_decay));
        }
        if !(0.0..=1.0).contains(&self.weight_decay) {
            return invalid(format!("weight decay {} is outside of [0, 1]", self.weight_decay));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return invalid(format!("momentum {} is outside of [0, 1)", self.momentum));
        }
        if let Some(bound) = self.max_weight_magnitude {
            if bound.is_nan() || bound <= 0.0 {
                return invalid(format!("weight magnitude bound {bound} must be positive"));
            }
        }
        Ok(())
    }
}

/// Per-epoch losses recorded by [`Network::train`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingStatistics {
    pub training_losses: Vec<f64>,
    /// Empty when the dataset has no validation partition.
    pub validation_losses: Vec<f64>,
}

impl TrainingStatistics {
    #[inline]
    pub fn epochs(&self) -> usize {
        self.training_losses.len()
    }

    /// Formats every `stride`-th epoch, all of them for a stride of 0.
    pub fn display_every(&self, stride: usize) -> impl Display + '_ {
        StatisticsReport { stats: self, stride }
    }
}

struct StatisticsReport<'a> {
    stats: &'a TrainingStatistics,
    stride: usize,
}

impl Display for StatisticsReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats;
        for (epoch, training) in stats.training_losses.iter().enumerate() {
            if self.stride != 0 && epoch % self.stride != 0 {
                continue;
            }
            write!(f, "Epoch <{epoch}> - training loss: <{training:.5}>")?;
            if let Some(validation) = stats.validation_losses.get(epoch) {
                write!(f, ", validation loss: <{validation:.5}>")?;
            }
            writeln!(f, ".")?;
        }
        Ok(())
    }
}

impl Display for TrainingStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.display_every(0), f)
    }
}

/// Feed-forward network made of hidden layers followed by a single output layer.
pub struct Network<T> {
    hidden: Vec<ConcreteLayer<T>>,
    output: Option<ConcreteLayer<T>>,
    params: HyperParameters,
}

impl<T: DTypeFloat> Network<T> {
    pub fn new(params: HyperParameters) -> Self {
        Network {
            hidden: Vec::new(),
            output: None,
            params,
        }
    }

    /// Appends a hidden layer, returning its index.
    pub fn add_hidden_layer<L: Into<ConcreteLayer<T>>>(&mut self, layer: L) -> usize {
        self.hidden.push(layer.into());
        self.hidden.len() - 1
    }

    /// Sets the output layer, returning its index (the number of hidden layers).
    pub fn set_output_layer<L: Into<ConcreteLayer<T>>>(&mut self, layer: L) -> Result<usize> {
        let layer = layer.into();
        if !layer.is_output() {
            return Err(Error::NotAnOutputLayer);
        }
        self.output = Some(layer);
        Ok(self.hidden.len())
    }

    /// Hidden layers are addressed first, the output layer comes last.
    pub fn layer(&self, index: usize) -> Option<&ConcreteLayer<T>> {
        if index == self.hidden.len() {
            self.output.as_ref()
        } else {
            self.hidden.get(index)
        }
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut ConcreteLayer<T>> {
        if index == self.hidden.len() {
            self.output.as_mut()
        } else {
            self.hidden.get_mut(index)
        }
    }

    #[inline]
    pub fn hidden_layer_count(&self) -> usize {
        self.hidden.len()
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.hidden.len() + usize::from(self.output.is_some())
    }

    #[inline]
    pub fn has_output_layer(&self) -> bool {
        self.output.is_some()
    }

    #[inline]
    pub fn hyper_parameters(&self) -> &HyperParameters {
        &self.params
    }

    #[inline]
    pub fn hyper_parameters_mut(&mut self) -> &mut HyperParameters {
        &mut self.params
    }

    fn layers_mut(&mut self) -> impl Iterator<Item = &mut ConcreteLayer<T>> {
        self.hidden.iter_mut().chain(self.output.iter_mut())
    }

    fn output_layer(&self) -> Result<&ConcreteLayer<T>> {
        self.output.as_ref().ok_or(Error::MissingOutputLayer)
    }

    fn output_loss_fn(&self) -> Result<LossFn> {
        self.output_layer()?
            .as_output()
            .map(|out| out.loss_fn())
            .ok_or(Error::NotAnOutputLayer)
    }

    /// Runs `input` through the hidden layers and, if present, the output layer.
    pub fn run_forward_pass(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        let mut layers = self.layers_mut();
        let Some(first) = layers.next() else {
            return Ok(input.clone());
        };
        let mut activations = first.forward(input)?;
        for layer in layers {
            activations = layer.forward(&activations)?;
        }
        Ok(activations)
    }

    /// Propagates the output gradient from the output layer back to the first hidden layer and
    /// returns the gradient with respect to the network input.
    pub fn run_backward_pass(&mut self, gradient: &Matrix<T>) -> Result<Matrix<T>> {
        let output = self.output.as_mut().ok_or(Error::MissingOutputLayer)?;
        let mut gradient = output.backward(gradient)?;
        for layer in self.hidden.iter_mut().rev() {
            gradient = layer.backward(&gradient)?;
        }
        Ok(gradient)
    }

    /// Gradient of the output layer's loss for `actual` network outputs.
    pub fn output_gradient(&self, actual: &Matrix<T>, expected: &Matrix<T>) -> Result<Matrix<T>> {
        self.output_loss_fn()?.output_gradient(actual, expected)
    }

    /// Applies one momentum SGD step with weight decay to every layer, using the gradients of
    /// the last backward pass. The step is computed for all layers before any is written, so
    /// the network is left untouched when it fails with [`Error::Diverged`].
    pub fn update_weights(&mut self) -> Result<()> {
        if self.output.is_none() {
            return Err(Error::MissingOutputLayer);
        }
        let lr = T::from_f64(self.params.learning_rate);
        let momentum = T::from_f64(self.params.momentum);
        let retain = T::from_f64(1.0 - self.params.learning_rate * (1.0 - self.params.weight_decay));
        let bound = self.params.max_weight_magnitude.map(T::from_f64);
        let mut steps = Vec::with_capacity(self.layer_count());
        for (index, layer) in self.hidden.iter().chain(self.output.iter()).enumerate() {
            let dense = layer.dense();
            let mut weight_velocity = dense.weight_velocity().scale(momentum);
            weight_velocity.add_assign(dense.weight_gradient())?;
            let mut bias_velocity = dense.bias_velocity().scale(momentum);
            bias_velocity.add_assign(dense.bias_gradient())?;
            let weights = dense.weights().scale(retain).sub(&weight_velocity.scale(lr))?;
            let biases = dense.biases().sub(&bias_velocity.scale(lr))?;
            if let Some(bound) = bound {
                let diverged = weights
                    .as_slice()
                    .iter()
                    .any(|w| !w.is_finite() || w.abs() > bound);
                if diverged {
                    return Err(Error::Diverged { layer: index });
                }
            }
            steps.push((weight_velocity, bias_velocity, weights, biases));
        }
        for (layer, (weight_velocity, bias_velocity, weights, biases)) in self.layers_mut().zip(steps) {
            let dense = layer.dense_mut();
            *dense.weight_velocity_mut() = weight_velocity;
            *dense.bias_velocity_mut() = bias_velocity;
            layer.update(weights, biases)?;
        }
        Ok(())
    }

    /// Forward, backward and update for a single batch. The output gradient is averaged over
    /// the examples of the batch.
    pub fn train_batch(&mut self, batch: &TrainingBatch<T>) -> Result<()> {
        let actual = self.run_forward_pass(&batch.features)?;
        let mut gradient = self.output_gradient(&actual, &batch.labels)?;
        if !batch.is_empty() {
            gradient.scale_in_place(T::ONE / T::from_usize(batch.len()));
        }
        self.run_backward_pass(&gradient)?;
        self.update_weights()
    }

    /// Mini-batch training over the training partition of `dataset` for the configured number
    /// of epochs. Batches are shuffled with the hyperparameter seed, and the learning rate is
    /// decayed after every epoch.
    pub fn train(
        &mut self,
        dataset: &TrainingDataset<T>,
        report_progress: bool,
    ) -> Result<TrainingStatistics> {
        self.params.validate()?;
        let loss_fn = self.output_loss_fn()?;
        if dataset.batch_count() == 0 {
            warn!(
                "training partition of {} examples holds no batch of {}",
                dataset.training_size(),
                dataset.batch_size()
            );
        }
        let epochs = self.params.epochs;
        debug!(
            "training {} layers for {epochs} epochs: {} training and {} validation examples, {} batches of {}",
            self.layer_count(),
            dataset.training_size(),
            dataset.validation_size(),
            dataset.batch_count(),
            dataset.batch_size()
        );

        let training_features = dataset.training_features();
        let training_labels = dataset.training_labels();
        let validation = dataset
            .has_validation_set()
            .then(|| (dataset.validation_features(), dataset.validation_labels()));

        let mut generator = TrainingBatchGenerator::new(
            dataset,
            BatchGeneratorParams {
                shuffle: true,
                seed: self.params.seed,
            },
        );
        let mut stats = TrainingStatistics {
            training_losses: Vec::with_capacity(epochs),
            validation_losses: Vec::with_capacity(epochs),
        };

        for epoch in 0..epochs {
            for (index, batch) in generator.by_ref().enumerate() {
                self.train_batch(&batch)?;
                trace!("epoch {}: batch {index} of {} examples done", epoch + 1, batch.len());
            }
            generator.reset();

            let predictions = self.run_forward_pass(&training_features)?;
            let training_loss = loss_fn.loss(&predictions, &training_labels)?.as_f64();
            stats.training_losses.push(training_loss);

            if let Some((features, labels)) = &validation {
                let predictions = self.run_forward_pass(features)?;
                let validation_loss = loss_fn.loss(&predictions, labels)?.as_f64();
                stats.validation_losses.push(validation_loss);
                let accuracy = scoring::evaluate(&predictions, labels)?.accuracy();
                let level = if report_progress { Level::Info } else { Level::Debug };
                log::log!(
                    level,
                    "Epoch {}/{epochs} - loss training: {training_loss:.4}, validation: {validation_loss:.4} (aprox. {:.2}%)",
                    epoch + 1,
                    accuracy * 100.0
                );
            } else if report_progress {
                info!("Epoch {}/{epochs} - loss training: {training_loss:.4}", epoch + 1);
            } else {
                debug!("Epoch {}/{epochs} - loss training: {training_loss:.4}", epoch + 1);
            }

            self.params.learning_rate *= self.params.learning_rate_decay;
        }
        Ok(stats)
    }
}

impl<T: DTypeFloat> Debug for Network<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("hidden", &self.hidden)
            .field("output", &self.output)
            .field("params", &self.params)
            .finish()
    }
}

/// Assembles a [`Network`] from layer widths. Hidden layers are He-normal initialized, the
/// softmax output layer Glorot-normal, each initializer seeded with the hyperparameter seed.
#[derive(Clone, Debug)]
pub struct NetworkBuilder {
    input_size: usize,
    params: HyperParameters,
    hidden: Vec<(usize, ActivationFn)>,
    output_size: Option<usize>,
}

impl NetworkBuilder {
    pub fn new(input_size: usize) -> Self {
        NetworkBuilder {
            input_size,
            params: HyperParameters::default(),
            hidden: Vec::new(),
            output_size: None,
        }
    }

    pub fn with_hyper_parameters(mut self, params: HyperParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    pub fn with_hidden_layer(mut self, size: usize, activation_fn: ActivationFn) -> Self {
        self.hidden.push((size, activation_fn));
        self
    }

    pub fn with_softmax_output(mut self, size: usize) -> Self {
        self.output_size = Some(size);
        self
    }

    pub fn build<T: DTypeFloat>(self) -> Result<Network<T>> {
        if self.input_size == 0 {
            return Err(Error::InvalidParameter("input size must be positive".into()));
        }
        if let Some(index) = self.hidden.iter().position(|&(size, _)| size == 0) {
            return Err(Error::InvalidParameter(format!("hidden layer {index} has no neurons")));
        }
        if self.hidden.iter().any(|&(_, a)| a == ActivationFn::Softmax) {
            return Err(Error::Unsupported("softmax activation in a hidden layer"));
        }
        let mut he = WeightInitializer::seed_from_u64(InitializerKind::HeNormal, self.params.seed);
        let mut glorot = WeightInitializer::seed_from_u64(InitializerKind::GlorotNormal, self.params.seed);
        let mut network = Network::new(self.params);
        let mut last_size = self.input_size;
        for &(size, activation_fn) in &self.hidden {
            network.add_hidden_layer(DenseLayer::with_initializer(last_size, size, activation_fn, &mut he));
            last_size = size;
        }
        if let Some(size) = self.output_size {
            if size == 0 {
                return Err(Error::InvalidParameter("output layer has no neurons".into()));
            }
            network.set_output_layer(SoftmaxOutputLayer::with_initializer(last_size, size, &mut glorot))?;
        }
        debug!("built network: {network:?}");
        Ok(network)
    }
}
