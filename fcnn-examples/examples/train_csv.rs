use fcnn::io::{load_dataset, write_matrix, DatasetPaths, LoadingParams};
use fcnn::scoring;
use fcnn_examples::config::load_config;
use fcnn_examples::delimited::{CsvReader, LabelWriter};
use fcnn_examples::util::{init_logging, timed};
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: train_csv <config.json> <data dir> [predictions.csv]";

/// Trains on `<data dir>/fashion_mnist_{train,test}_{vectors,labels}.csv` with the network
/// described by the config and writes the predicted test labels.
pub fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(config_path), Some(data_dir)) = (args.first(), args.get(1)) else {
        return Err(USAGE.into());
    };
    let data_dir = PathBuf::from(data_dir);
    let predictions_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("test_predictions.csv"));

    let config = load_config(Path::new(config_path))?;
    println!("{config}");

    let paths = DatasetPaths {
        training_features: data_dir.join("fashion_mnist_train_vectors.csv"),
        training_labels: data_dir.join("fashion_mnist_train_labels.csv"),
        testing_features: data_dir.join("fashion_mnist_test_vectors.csv"),
        testing_labels: data_dir.join("fashion_mnist_test_labels.csv"),
    };
    info!("Loading data...");
    let loaded = load_dataset(
        &CsvReader::new(),
        &paths,
        config.dataset_params(),
        LoadingParams {
            class_count: config.expected_class_count(),
            one_hot_encode: true,
            normalization_factor: 256.0,
        },
    )?;

    let mut net = config.build_network()?;
    info!("Training...");
    let (stats, elapsed) = timed(|| net.train(&loaded.training, true));
    let stats = stats?;
    println!("Training time: {:.3} seconds.\n", elapsed.as_secs_f64());
    println!("{stats}");

    info!("Evaluation...");
    let result = net.run_forward_pass(&loaded.testing_features)?;
    println!("{}", scoring::evaluate(&result, &loaded.testing_labels)?);

    write_matrix(&LabelWriter, &predictions_path, &result)?;
    info!("Predictions written to <{}>", predictions_path.display());
    Ok(())
}
