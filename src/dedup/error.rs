use thiserror::Error;

#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Explicit confirmation is required before any deletion is executed")]
    ConfirmationRequired,

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, DedupError>;
