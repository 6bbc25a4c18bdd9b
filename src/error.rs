use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Numeric error: {0}")]
    Numeric(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Coarse classification used by callers that only care whether a search
/// failed on its inputs, its numerics, or its workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Numeric,
    Worker,
    Ambient,
}

impl AllocError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Numeric(_) => ErrorKind::Numeric,
            Self::Worker(_) => ErrorKind::Worker,
            _ => ErrorKind::Ambient,
        }
    }
}

pub type Result<T> = std::result::Result<T, AllocError>;
