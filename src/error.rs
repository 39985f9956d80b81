use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("failed to open frame source: {0}")]
    Source(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SummarizeError>;
