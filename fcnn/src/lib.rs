pub mod activation;
pub mod data;
pub mod dtype;
pub mod error;
pub mod io;
pub mod loss;
pub mod matrix;
pub mod net;
pub mod scoring;
pub mod util;

pub use error::{Error, Result};

extern crate matrixmultiply;
extern crate num_traits;
extern crate rand;
extern crate rand_distr;
