// Bulldozer Vault — Credential data models
//
// SECURITY: the `ciphertext` field is intentionally private and redacted from
// Debug output. Plaintext payloads never appear on these types at all — the
// only decryption path is `CredentialVault::get_credential_decrypted`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag describing the shape of a credential payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum CredentialType {
    /// A single secret token, e.g. `{"api_key": "..."}`.
    #[serde(rename = "api_key")]
    #[value(name = "api_key")]
    ApiKey,
    /// A username/password pair.
    #[serde(rename = "basic_auth")]
    #[value(name = "basic_auth")]
    BasicAuth,
    /// An access/refresh token pair.
    #[serde(rename = "oauth")]
    #[value(name = "oauth")]
    OAuth,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::ApiKey => "api_key",
            CredentialType::BasicAuth => "basic_auth",
            CredentialType::OAuth => "oauth",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown credential type: {0}")]
pub struct UnknownCredentialType(pub String);

impl FromStr for CredentialType {
    type Err = UnknownCredentialType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api_key" => Ok(CredentialType::ApiKey),
            "basic_auth" => Ok(CredentialType::BasicAuth),
            "oauth" => Ok(CredentialType::OAuth),
            other => Err(UnknownCredentialType(other.to_string())),
        }
    }
}

/// One stored credential row: the encrypted payload for a (user, service) pair.
/// The `ciphertext` field is private — access only via `ciphertext()`.
pub struct CredentialRecord {
    pub user_id: i64,
    pub service_name: String,
    pub credential_type: CredentialType,
    /// Encrypted payload blob — never logged or Debug-displayed
    ciphertext: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: i64,
        service_name: String,
        credential_type: CredentialType,
        ciphertext: String,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_used_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            service_name,
            credential_type,
            ciphertext,
            is_active,
            created_at,
            updated_at,
            last_used_at,
        }
    }

    /// Access the encrypted blob. Only useful to the vault's own decrypt path;
    /// the blob does not round-trip without the process key.
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    /// Metadata-only view of this record, safe to serialize and display.
    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            user_id: self.user_id,
            service_name: self.service_name.clone(),
            credential_type: self.credential_type,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_used_at: self.last_used_at,
        }
    }
}

/// Custom Debug implementation that never reveals the ciphertext.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("user_id", &self.user_id)
            .field("service_name", &self.service_name)
            .field("credential_type", &self.credential_type)
            .field("ciphertext", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("last_used_at", &self.last_used_at)
            .finish()
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) for user {} — {}",
            self.service_name,
            self.credential_type,
            self.user_id,
            if self.is_active { "active" } else { "inactive" }
        )
    }
}

/// A lightweight view of a credential, used for listing.
/// Carries no ciphertext and no plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub user_id: i64,
    pub service_name: String,
    pub credential_type: CredentialType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl fmt::Display for CredentialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) for user {} — {}",
            self.service_name,
            self.credential_type,
            self.user_id,
            if self.is_active { "active" } else { "inactive" }
        )
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
