use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Shapes of the operands violate the precondition of a binary operation.
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// A data buffer does not match the declared matrix shape.
    Construction {
        rows: usize,
        cols: usize,
        len: usize,
    },
    OutOfBounds {
        op: &'static str,
        index: usize,
        bound: usize,
    },
    Numerical(&'static str),
    Unsupported(&'static str),
    InvalidParameter(String),
    MissingOutputLayer,
    NotAnOutputLayer,
    /// The weight magnitude check failed after an update of the given layer.
    Diverged {
        layer: usize,
    },
    InvalidLabel {
        example: usize,
        value: f64,
    },
    Read {
        path: PathBuf,
        message: String,
    },
    Write {
        path: PathBuf,
        message: String,
    },
}

impl Error {
    pub(crate) fn mismatch(op: &'static str, left: (usize, usize), right: (usize, usize)) -> Self {
        Error::DimensionMismatch { op, left, right }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DimensionMismatch { op, left, right } => write!(
                f,
                "dimension mismatch in {op}: left is {}x{}, right is {}x{}",
                left.0, left.1, right.0, right.1
            ),
            Error::Construction { rows, cols, len } => write!(
                f,
                "cannot build a {rows}x{cols} matrix from {len} elements"
            ),
            Error::OutOfBounds { op, index, bound } => {
                write!(f, "index {index} out of bounds in {op} (bound {bound})")
            }
            Error::Numerical(msg) => write!(f, "numerical error: {msg}"),
            Error::Unsupported(msg) => write!(f, "unsupported operation: {msg}"),
            Error::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Error::MissingOutputLayer => f.write_str("the network has no output layer"),
            Error::NotAnOutputLayer => f.write_str("the layer cannot be used as an output layer"),
            Error::Diverged { layer } => write!(f, "weights of layer {layer} diverged"),
            Error::InvalidLabel { example, value } => {
                write!(f, "invalid class label {value} for example {example}")
            }
            Error::Read { path, message } => {
                write!(f, "failed to read <{}>: {message}", path.display())
            }
            Error::Write { path, message } => {
                write!(f, "failed to write <{}>: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {}
