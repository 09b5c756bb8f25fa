// Bulldozer Vault — Library root
//
// Re-exports the cipher, store, and CLI modules.

pub mod cipher;
pub mod cli;
pub mod error;
pub mod store;

pub use error::{Result, VaultError};
