use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Canceled: {0}")]
    Cancelled(String),
    #[error("Invalid input data: {0}")]
    Data(String),
    #[error("Failed to reach host: {0}")]
    Connection(#[from] reqwest::Error),
    #[error("Bulk request failed with status {status}")]
    Submission { status: StatusCode, body: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Data(err.to_string())
    }
}

impl ImportError {
    /// Response body attached to the error, if the server answered at all.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ImportError::Submission { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
