// Bulldozer Vault — Store Module
//
// Durable mapping from (user, service) to an encrypted credential record:
// validated upsert, decrypt-on-read with self-healing deactivation, listing,
// soft-deactivation, hard-removal, and usage-timestamp tracking.

mod db;
mod error;
mod models;
mod repository;
mod schema;

pub use db::Database;
pub use error::StoreError;
pub use models::{CredentialRecord, CredentialSummary, CredentialType, UnknownCredentialType};
pub use repository::{CredentialVault, SqliteCredentialVault};
pub use schema::{CredentialShape, SchemaRegistry};
