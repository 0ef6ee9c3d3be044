use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    /// A hyperparameter or topology setting is invalid.
    InvalidConfig(String),
    /// Dimensions or sample counts do not line up.
    InvalidShape(String),
    /// Dataset or serialized payload contents are invalid.
    InvalidData(String),
    /// The model has no parameters yet; call `fit` (or an initializer) first.
    NotFitted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::NotFitted => write!(f, "model has not been fitted yet"),
        }
    }
}

impl std::error::Error for Error {}
