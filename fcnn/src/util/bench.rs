use crate::dtype::DType;
use crate::matrix::{Matrix, RandomConfig};

pub const SIZE_LG: usize = 1024;
pub const SIZE_MD: usize = 256;
pub const SIZE_SM: usize = 64;
const SEED: u64 = 0x8371943;

/// Two seeded `size x size` operands drawn uniformly from `[-1, 1)`.
pub fn get_square_matrices<T: DType>(size: usize) -> [Matrix<T>; 2] {
    let config = |seed| RandomConfig {
        min: -1.0,
        max: 1.0,
        seed,
    };
    [
        Matrix::random(size, size, &config(SEED)),
        Matrix::random(size, size, &config(SEED + 1)),
    ]
}
