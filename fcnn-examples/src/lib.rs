pub mod config;
pub mod delimited;
pub mod util;
