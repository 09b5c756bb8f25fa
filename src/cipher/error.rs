// Bulldozer Vault — Cipher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption key misconfigured: {0}")]
    Configuration(String),

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encryption failed")]
    Encryption,

    #[error("Failed to decrypt credential: authentication failed or data corrupted")]
    Decryption,
}
