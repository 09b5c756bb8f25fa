// Bulldozer Vault — Top-level error types
//
// Aggregates errors from the cipher and store modules into a single
// error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Cipher error: {0}")]
    Cipher(#[from] crate::cipher::CipherError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;
