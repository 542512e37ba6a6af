use thiserror::Error;

#[derive(Error, Debug)]
pub enum EegError {
    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode signal: {0}")]
    Decode(String),

    #[error("Spectral estimation failed: {0}")]
    Spectral(String),

    #[error("Spectral backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid signal record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EegError>;
