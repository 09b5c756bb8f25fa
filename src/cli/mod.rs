// Bulldozer Vault — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: gen-key, add, list, services, test, deactivate, remove.

mod commands;

use clap::{Parser, Subcommand};

use crate::store::CredentialType;

pub use commands::execute;

/// Bulldozer Vault — encrypted per-user credential storage for external data providers.
#[derive(Parser, Debug)]
#[command(name = "bulldozer-vault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh encryption key for CREDENTIAL_ENCRYPTION_KEY.
    GenKey,

    /// Add or update a credential for a (user, service) pair.
    Add {
        /// The owning user's numeric ID.
        #[arg(long)]
        user: i64,

        /// The service name (e.g. "osha_api", "pacer", "fec_api").
        #[arg(long)]
        service: String,

        /// The credential payload shape tag.
        #[arg(long = "type", value_enum)]
        credential_type: CredentialType,

        /// Payload fields as KEY=VALUE pairs (e.g. api_key=sk_123).
        /// For production use, prefer interactive entry to avoid shell history exposure.
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// List a user's credentials (metadata only, no secrets).
    List {
        /// The owning user's numeric ID.
        #[arg(long)]
        user: i64,

        /// Include deactivated credentials.
        #[arg(long)]
        all: bool,
    },

    /// Show which services a user has usable credentials for.
    Services {
        /// The owning user's numeric ID.
        #[arg(long)]
        user: i64,
    },

    /// Verify that a stored credential still decrypts cleanly.
    Test {
        /// The owning user's numeric ID.
        #[arg(long)]
        user: i64,

        /// The service name.
        #[arg(long)]
        service: String,
    },

    /// Deactivate a credential without deleting it.
    Deactivate {
        /// The owning user's numeric ID.
        #[arg(long)]
        user: i64,

        /// The service name.
        #[arg(long)]
        service: String,
    },

    /// Permanently remove a credential.
    Remove {
        /// The owning user's numeric ID.
        #[arg(long)]
        user: i64,

        /// The service name.
        #[arg(long)]
        service: String,
    },
}
