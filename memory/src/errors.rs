use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("HTTP error: {status_code} - {message}")]
    Http { status_code: u16, message: String },
    #[error("Parsing error: {0}")]
    Parsing(String),
}

pub type MemoryResult<T> = Result<T, MemoryStoreError>;
