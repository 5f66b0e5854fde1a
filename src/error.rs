use std::fmt::Display;

use bincode::ErrorKind;

/// Custom Result type for restodb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for restodb
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Schema-definition or field parsing error
    Parse(String),
    /// File access error during bulk load
    Io(String),
    /// Internal error (storage, serialization, etc.)
    Internal(String),
}

impl From<std::num::ParseIntError> for Error {
    fn from(value: std::num::ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(value: std::num::ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        if value.is_io_error() {
            Error::Io(value.to_string())
        } else {
            Error::Parse(value.to_string())
        }
    }
}

impl From<Box<ErrorKind>> for Error {
    fn from(value: Box<ErrorKind>) -> Self {
        Error::Internal(value.to_string())
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parse error {}", err),
            Error::Io(err) => write!(f, "io error {}", err),
            Error::Internal(err) => write!(f, "internal error {}", err),
        }
    }
}
