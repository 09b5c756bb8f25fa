// Bulldozer Vault — Cipher Module
//
// Authenticated symmetric encryption of credential payloads. The process-wide
// key is sourced from CREDENTIAL_ENCRYPTION_KEY at startup; absence of a key
// is a fatal configuration error.

mod aead;
mod error;

pub use aead::{CredentialCipher, KEY_ENV_VAR};
pub use error::CipherError;
