use std::{error::Error, fmt, io};

use machine_learning::MlErr;

/// The sweep's result type.
pub type Result<T> = std::result::Result<T, SweepErr>;

/// Failures while configuring or running a sweep.
#[derive(Debug)]
pub enum SweepErr {
    Ml(MlErr),
    Io(io::Error),
    Config(String),
    EmptyGrid,
}

impl fmt::Display for SweepErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepErr::Ml(e) => write!(f, "{e}"),
            SweepErr::Io(e) => write!(f, "io error: {e}"),
            SweepErr::Config(msg) => write!(f, "invalid config: {msg}"),
            SweepErr::EmptyGrid => write!(f, "the hyperparameter grid has no combinations"),
        }
    }
}

impl Error for SweepErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SweepErr::Ml(e) => Some(e),
            SweepErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for SweepErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<io::Error> for SweepErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
