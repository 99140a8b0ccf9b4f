use fcnn::dtype::DType;
use fcnn::matrix::Matrix;
use std::time::{Duration, Instant};

/// The four XOR inputs as columns and their one-hot `[false, true]` labels.
pub fn xor_data<D: DType>() -> (Matrix<D>, Matrix<D>) {
    let inputs = Matrix::from_fn(2, 4, |row, col| D::from_usize((col >> (1 - row)) & 1));
    let labels = Matrix::from_fn(2, 4, |row, col| {
        let xor = (col >> 1) ^ (col & 1);
        if xor == row { D::ONE } else { D::ZERO }
    });
    (inputs, labels)
}

/// Runs `f` and returns its result together with the wall time it took.
pub fn timed<R, F: FnOnce() -> R>(f: F) -> (R, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
