use std::{error::Error, fmt, io};

use machine_learning::MlErr;

pub type Result<T> = std::result::Result<T, ServerErr>;

/// Failures while starting the server.
#[derive(Debug)]
pub enum ServerErr {
    Io(io::Error),
    Model(MlErr),
    Config(String),
}

impl fmt::Display for ServerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerErr::Io(e) => write!(f, "io error: {e}"),
            ServerErr::Model(e) => write!(f, "failed to load model: {e}"),
            ServerErr::Config(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for ServerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServerErr::Io(e) => Some(e),
            ServerErr::Model(e) => Some(e),
            ServerErr::Config(_) => None,
        }
    }
}

impl From<io::Error> for ServerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<MlErr> for ServerErr {
    fn from(value: MlErr) -> Self {
        Self::Model(value)
    }
}

impl From<ServerErr> for io::Error {
    fn from(value: ServerErr) -> Self {
        match value {
            ServerErr::Io(e) => e,
            ServerErr::Config(_) => io::Error::new(io::ErrorKind::InvalidInput, value),
            ServerErr::Model(_) => io::Error::other(value),
        }
    }
}
