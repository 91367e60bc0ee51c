use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("invalid address length: expected 20, got {0}")]
    InvalidAddressLength(usize),

    #[error("invalid bech32 prefix: {0}")]
    InvalidPrefix(String),

    #[error("bech32 error: {0}")]
    Bech32Error(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),
}
