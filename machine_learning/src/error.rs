use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use ndarray::ShapeError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    Io(io::Error),
    Json(serde_json::Error),
    Shape(ShapeError),
    Parse {
        line: usize,
        msg: String,
    },
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyDataset,
    EmptyPartition(&'static str),
    SingleClass {
        class: usize,
    },
    InvalidFractions {
        train: f64,
        validation: f64,
        test: f64,
    },
    InvalidParam {
        name: &'static str,
        value: f64,
    },
    InvalidModel(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::Io(e) => write!(f, "io error: {e}"),
            MlErr::Json(e) => write!(f, "json error: {e}"),
            MlErr::Shape(e) => write!(f, "shape error: {e}"),
            MlErr::Parse { line, msg } => write!(f, "parse error at line {line}: {msg}"),
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            MlErr::EmptyDataset => write!(f, "the dataset has no samples"),
            MlErr::EmptyPartition(name) => write!(f, "the {name} partition has no samples"),
            MlErr::SingleClass { class } => write!(
                f,
                "the training labels contain a single class ({class}), at least two are needed"
            ),
            MlErr::InvalidFractions {
                train,
                validation,
                test,
            } => write!(
                f,
                "split fractions must be non-negative and add up to 1, got {train} + {validation} + {test}"
            ),
            MlErr::InvalidParam { name, value } => {
                write!(f, "invalid value for {name}: {value}, expected a positive finite number")
            }
            MlErr::InvalidModel(msg) => write!(f, "inconsistent model: {msg}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            MlErr::Json(e) => Some(e),
            MlErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}
