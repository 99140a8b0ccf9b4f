use fcnn::activation::ActivationFn;
use fcnn::data::{DatasetParams, TrainingDataset};
use fcnn::net::initializer::{InitializerKind, WeightInitializer};
use fcnn::net::layer::{DenseLayer, SoftmaxOutputLayer};
use fcnn::net::{HyperParameters, Network};
use fcnn::scoring;
use fcnn_examples::util::{init_logging, timed, xor_data};

pub fn main() -> Result<(), fcnn::Error> {
    init_logging();
    let (inputs, labels) = xor_data::<f32>();

    let mut net = Network::new(HyperParameters {
        learning_rate: 0.5,
        epochs: 2000,
        ..Default::default()
    });
    let mut init = WeightInitializer::seed_from_u64(InitializerKind::GlorotNormal, 42);
    let leaky = ActivationFn::leaky_relu();
    net.add_hidden_layer(DenseLayer::with_initializer(2, 4, leaky, &mut init));
    net.add_hidden_layer(DenseLayer::with_initializer(4, 4, leaky, &mut init));
    net.set_output_layer(SoftmaxOutputLayer::with_initializer(4, 2, &mut init))?;

    let dataset = TrainingDataset::new(
        inputs.clone(),
        labels.clone(),
        DatasetParams {
            batch_size: 4,
            validation_fraction: 0.0,
        },
    )?;
    let (stats, elapsed) = timed(|| net.train(&dataset, false));
    let stats = stats?;
    println!("Training time: {:.3} seconds.", elapsed.as_secs_f64());
    println!("{}", stats.display_every(200));

    let result = net.run_forward_pass(&inputs)?;
    println!("{result}");
    println!("{}", scoring::evaluate(&result, &labels)?);
    Ok(())
}
