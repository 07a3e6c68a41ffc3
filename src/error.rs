use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors surfaced by the ledger client during lookups, submission and
/// confirmation. All of these are recoverable at the run level: the dispatch
/// loop fails the current recipient and moves on.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Confirmation timed out after {0} seconds")]
    ConfirmationTimeout(u64),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Config(format!("I/O error: {}", error))
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(error: reqwest::Error) -> Self {
        LedgerError::Rpc(format!("HTTP request error: {}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
