use thiserror::Error;

/// Custom error types for the historic-iv library
#[derive(Error, Debug)]
pub enum ChainError {

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request parameters: {0}")]
    InvalidParameters(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Plotting error: {0}")]
    PlotError(String),

    #[error("DataFrame error: {0}")]
    DataFrameError(String),

    #[error("No data found or error in fetching data")]
    NoData,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
