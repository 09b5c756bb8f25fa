// Bulldozer Vault — Store error types

use thiserror::Error;

use crate::cipher::CipherError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Invalid credential payload for service '{service}': missing fields {missing:?}")]
    Validation {
        service: String,
        missing: Vec<String>,
    },
}
