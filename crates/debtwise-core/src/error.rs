//! Error types for Debtwise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A debt or payment field was missing, non-numeric or out of range.
    /// Raised before any allocation happens.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Debt not found: {0}")]
    DebtNotFound(i64),

    /// The text-generation collaborator failed or timed out
    #[error("Advisor unavailable: {0}")]
    AdvisoryUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error came from the storage layer
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Pool(_) | Self::Encryption(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
