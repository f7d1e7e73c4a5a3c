use crate::core::{quote::QuoteStatus, validation::ValidationIssue};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid stored data: {message}")]
    InvalidData { message: String },

    #[error("Quote not found: {id}")]
    QuoteNotFound { id: i64 },

    #[error("Invoice not found: {id}")]
    InvoiceNotFound { id: i64 },

    #[error("Quote {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: i64, expected: i32, found: i32 },

    #[error("Cannot move quote from {from} to {to}")]
    InvalidStatusTransition { from: QuoteStatus, to: QuoteStatus },

    #[error("Quote {number} has not been saved yet")]
    QuoteNotSaved { number: String },

    #[error("Cannot invoice quote {number}: it is not signed")]
    QuoteNotSigned { number: String },

    #[error("Quote failed validation ({} issue(s))", issues.len())]
    Validation { issues: Vec<ValidationIssue> },

    #[error("Invalid amount: {value}")]
    InvalidAmount { value: Decimal },

    #[error("Line item index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
