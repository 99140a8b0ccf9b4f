use fcnn::activation::ActivationFn;
use fcnn::data::DatasetParams;
use fcnn::net::{HyperParameters, Network, NetworkBuilder};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    NotAFile(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
    Network(fcnn::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "File <{}> was not found!", path.display()),
            ConfigError::NotAFile(path) => write!(
                f,
                "Path <{}> exists but is not a regular file!",
                path.display()
            ),
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read <{}>: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {err}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
            ConfigError::Network(err) => write!(f, "Failed to build network: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        ConfigError::Parse(value)
    }
}

impl From<fcnn::Error> for ConfigError {
    fn from(value: fcnn::Error) -> Self {
        ConfigError::Network(value)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub input_number: usize,
    pub output_number: usize,
}

/// Training run settings read from JSON. Missing keys fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub random_seed: u64,
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_set_fraction: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub learning_rate_decay: f64,
    pub layers: Vec<LayerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            random_seed: 42,
            learning_rate: 0.01,
            epochs: 10,
            batch_size: 256,
            validation_set_fraction: 0.2,
            momentum: 0.0,
            weight_decay: 1.0,
            learning_rate_decay: 1.0,
            layers: vec![],
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        return Err(ConfigError::NotFound(path));
    }
    if !path.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Number of classes predicted by the last layer, 0 without layers.
    pub fn expected_class_count(&self) -> usize {
        self.layers.last().map_or(0, |l| l.output_number)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::Invalid("no layers configured".into()));
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].output_number != pair[1].input_number {
                return Err(ConfigError::Invalid(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i + 1,
                    pair[0].output_number,
                    i + 2,
                    pair[1].input_number
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.validation_set_fraction) {
            return Err(ConfigError::Invalid(format!(
                "validation set fraction {} is outside of [0, 1]",
                self.validation_set_fraction
            )));
        }
        self.hyper_parameters()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn hyper_parameters(&self) -> HyperParameters {
        HyperParameters {
            learning_rate: self.learning_rate,
            learning_rate_decay: self.learning_rate_decay,
            weight_decay: self.weight_decay,
            momentum: self.momentum,
            epochs: self.epochs,
            seed: self.random_seed,
            ..Default::default()
        }
    }

    pub fn dataset_params(&self) -> DatasetParams {
        DatasetParams {
            batch_size: self.batch_size,
            validation_fraction: self.validation_set_fraction,
        }
    }

    /// Leaky ReLU hidden layers followed by a softmax output layer, one per configured layer.
    pub fn build_network(&self) -> Result<Network<f32>, ConfigError> {
        let (last, hidden) = self
            .layers
            .split_last()
            .ok_or_else(|| ConfigError::Invalid("no layers configured".into()))?;
        let input_size = hidden.first().unwrap_or(last).input_number;
        let builder = hidden.iter().fold(
            NetworkBuilder::new(input_size).with_hyper_parameters(self.hyper_parameters()),
            |builder, layer| builder.with_hidden_layer(layer.output_number, ActivationFn::leaky_relu()),
        );
        Ok(builder.with_softmax_output(last.output_number).build()?)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Neural Network Config ---")?;
        writeln!(f, "General settings:")?;
        writeln!(f, "  Random seed:            {}", self.random_seed)?;
        writeln!(f, "  Learning rate:          {:.4}", self.learning_rate)?;
        writeln!(f, "  Learning rate decay:    {:.4}", self.learning_rate_decay)?;
        writeln!(f, "  Momentum:               {:.4}", self.momentum)?;
        writeln!(f, "  Weight decay:           {:.4}", self.weight_decay)?;
        writeln!(f, "  Epochs:                 {}", self.epochs)?;
        writeln!(f, "  Batch size:             {}", self.batch_size)?;
        writeln!(f, "  Validation fraction:    {:.4}", self.validation_set_fraction)?;
        writeln!(f, "  Expected classes:       {}", self.expected_class_count())?;
        writeln!(f)?;
        writeln!(f, "Layers abstraction (total {} layers):", self.layers.len())?;
        if self.layers.is_empty() {
            writeln!(f, "    (No layers found)")?;
        }
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(
                f,
                "    Layer {}: input={}, output={}",
                i + 1,
                layer.input_number,
                layer.output_number
            )?;
        }
        Ok(())
    }
}
