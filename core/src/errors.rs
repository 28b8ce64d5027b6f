use thiserror::Error;

/// Errors raised by the chat provider client and configuration loading
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Response Error: {0}")]
    ResponseError(String),

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },
}

impl CoreError {
    /// True for errors that mean the process cannot start at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::ConfigError(_))
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
