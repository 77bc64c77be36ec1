//! Catalog error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid length: expected {expected} digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("ordering scope unresolved: member has no owner")]
    ScopeUnresolved,

    #[error("invalid media type: {0}")]
    InvalidMediaType(String),

    #[error("Media not found")]
    MediaNotFound,

    #[error("Variant not found")]
    VariantNotFound,

    #[error("{field} {code} is already assigned")]
    DuplicateCode { field: &'static str, code: String },

    #[error("no unused product code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CatalogError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
