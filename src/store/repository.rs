// Bulldozer Vault — Credential Store Repository
//
// CRUD lifecycle over encrypted credential rows, keyed by (user, service).
// Key design decision: listing returns metadata only; plaintext is reachable
// ONLY via `get_credential_decrypted()`, and a row whose blob fails
// authentication is deactivated on that read instead of surfacing the error.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::cipher::{CipherError, CredentialCipher};

use super::db::Database;
use super::models::{CredentialRecord, CredentialSummary, CredentialType};
use super::schema::SchemaRegistry;
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the credential vault's storage operations.
pub trait CredentialVault {
    /// Add or update the credential for (user, service).
    ///
    /// Validates the payload against the service's declared schema, encrypts
    /// it, and upserts the row. An existing row for the pair is overwritten
    /// in place and reactivated. Returns the resulting record's metadata.
    fn add_credential(
        &self,
        user_id: i64,
        service_name: &str,
        credential_type: CredentialType,
        payload: &BTreeMap<String, String>,
    ) -> Result<CredentialSummary, StoreError>;

    /// Get the active credential row for (user, service), still encrypted.
    fn get_credential(
        &self,
        user_id: i64,
        service_name: &str,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Get and decrypt the active credential for (user, service).
    ///
    /// Returns `None` when no active row exists — "not configured" is a
    /// normal outcome, not an error. A row that fails authenticated
    /// decryption is deactivated as a side effect and also reported as
    /// `None`, so retries do not repeatedly attempt a doomed decrypt.
    /// Does NOT bump `last_used_at`; callers report successful use
    /// explicitly via `update_last_used`.
    fn get_credential_decrypted(
        &self,
        user_id: i64,
        service_name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, StoreError>;

    /// List a user's credentials, newest-created-first. Metadata only.
    fn get_all_credentials(
        &self,
        user_id: i64,
        active_only: bool,
    ) -> Result<Vec<CredentialSummary>, StoreError>;

    /// Hard-delete the credential for (user, service), whatever its state.
    /// Returns whether a row was actually removed; repeated calls are safe.
    fn remove_credential(&self, user_id: i64, service_name: &str) -> Result<bool, StoreError>;

    /// Soft-delete: mark the active row inactive, retaining it for audit.
    /// Returns whether an active row existed; repeated calls return false.
    fn deactivate_credential(&self, user_id: i64, service_name: &str) -> Result<bool, StoreError>;

    /// Best-effort `last_used_at` bump after a confirmed successful use of
    /// the decrypted credential. A missing row is silently a no-op.
    fn update_last_used(&self, user_id: i64, service_name: &str) -> Result<(), StoreError>;

    /// Service names the user holds active credentials for. Used for
    /// capability discovery; decrypts nothing.
    fn get_services_with_credentials(&self, user_id: i64) -> Result<BTreeSet<String>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteCredentialVault<'a> {
    db: &'a Database,
    cipher: &'a CredentialCipher,
    schemas: SchemaRegistry,
}

impl<'a> SqliteCredentialVault<'a> {
    /// Vault over the given database and cipher, with the default service
    /// schemas registered.
    pub fn new(db: &'a Database, cipher: &'a CredentialCipher) -> Self {
        Self::with_registry(db, cipher, SchemaRegistry::with_defaults())
    }

    /// Vault with a caller-supplied schema registry.
    pub fn with_registry(
        db: &'a Database,
        cipher: &'a CredentialCipher,
        schemas: SchemaRegistry,
    ) -> Self {
        Self {
            db,
            cipher,
            schemas,
        }
    }

    /// Parse a full credential row from the database.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
        let user_id: i64 = row.get(0)?;
        let service_name: String = row.get(1)?;
        let type_str: String = row.get(2)?;
        let ciphertext: String = row.get(3)?;
        let is_active: bool = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;
        let last_used_at_str: Option<String> = row.get(7)?;

        let credential_type: CredentialType = type_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(CredentialRecord::new(
            user_id,
            service_name,
            credential_type,
            ciphertext,
            is_active,
            Self::parse_timestamp(&created_at_str),
            Self::parse_timestamp(&updated_at_str),
            last_used_at_str.as_deref().map(Self::parse_timestamp),
        ))
    }

    /// Parse a summary row (no encrypted payload in the projection).
    fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialSummary> {
        let user_id: i64 = row.get(0)?;
        let service_name: String = row.get(1)?;
        let type_str: String = row.get(2)?;
        let is_active: bool = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;
        let last_used_at_str: Option<String> = row.get(6)?;

        let credential_type: CredentialType = type_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(CredentialSummary {
            user_id,
            service_name,
            credential_type,
            is_active,
            created_at: Self::parse_timestamp(&created_at_str),
            updated_at: Self::parse_timestamp(&updated_at_str),
            last_used_at: last_used_at_str.as_deref().map(Self::parse_timestamp),
        })
    }

    fn parse_timestamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

impl CredentialVault for SqliteCredentialVault<'_> {
    fn add_credential(
        &self,
        user_id: i64,
        service_name: &str,
        credential_type: CredentialType,
        payload: &BTreeMap<String, String>,
    ) -> Result<CredentialSummary, StoreError> {
        self.schemas.validate(service_name, payload)?;

        let encrypted = self.cipher.encrypt(payload)?;
        let now = Utc::now().to_rfc3339();

        // The upsert resolves on the UNIQUE(user_id, service_name) constraint,
        // so concurrent adds for the same pair collapse to last-writer-wins
        // with exactly one row. created_at survives updates.
        self.db.conn().execute(
            "INSERT INTO user_credentials
                (user_id, service_name, credential_type, encrypted_payload,
                 is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
             ON CONFLICT(user_id, service_name) DO UPDATE SET
                credential_type   = excluded.credential_type,
                encrypted_payload = excluded.encrypted_payload,
                is_active         = 1,
                updated_at        = excluded.updated_at",
            params![
                user_id,
                service_name,
                credential_type.as_str(),
                encrypted,
                now
            ],
        )?;

        tracing::info!(user_id, service = service_name, "Credential stored");

        let record = self
            .get_credential(user_id, service_name)?
            .ok_or(StoreError::Database(rusqlite::Error::QueryReturnedNoRows))?;
        Ok(record.summary())
    }

    fn get_credential(
        &self,
        user_id: i64,
        service_name: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT user_id, service_name, credential_type, encrypted_payload,
                    is_active, created_at, updated_at, last_used_at
             FROM user_credentials
             WHERE user_id = ?1 AND service_name = ?2 AND is_active = 1",
        )?;

        let mut rows = stmt.query_map(params![user_id, service_name], Self::row_to_record)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(StoreError::Database(e)),
            None => Ok(None),
        }
    }

    fn get_credential_decrypted(
        &self,
        user_id: i64,
        service_name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, StoreError> {
        let Some(record) = self.get_credential(user_id, service_name)? else {
            return Ok(None);
        };

        match self.cipher.decrypt(record.ciphertext()) {
            Ok(payload) => Ok(Some(payload)),
            Err(CipherError::Decryption) => {
                // Key rotated, storage corruption, or tampering. Deactivate so
                // the next read reports "not configured" without retrying a
                // doomed decrypt; the user must re-submit the credential.
                tracing::warn!(
                    user_id,
                    service = service_name,
                    "Stored credential failed authentication — deactivating"
                );
                self.deactivate_credential(user_id, service_name)?;
                Ok(None)
            }
            Err(e) => Err(StoreError::Cipher(e)),
        }
    }

    fn get_all_credentials(
        &self,
        user_id: i64,
        active_only: bool,
    ) -> Result<Vec<CredentialSummary>, StoreError> {
        let sql = if active_only {
            "SELECT user_id, service_name, credential_type, is_active,
                    created_at, updated_at, last_used_at
             FROM user_credentials
             WHERE user_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, id DESC"
        } else {
            "SELECT user_id, service_name, credential_type, is_active,
                    created_at, updated_at, last_used_at
             FROM user_credentials
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        };

        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = stmt.query_map(params![user_id], Self::row_to_summary)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }

        Ok(summaries)
    }

    fn remove_credential(&self, user_id: i64, service_name: &str) -> Result<bool, StoreError> {
        let affected = self.db.conn().execute(
            "DELETE FROM user_credentials WHERE user_id = ?1 AND service_name = ?2",
            params![user_id, service_name],
        )?;

        if affected > 0 {
            tracing::info!(user_id, service = service_name, "Credential removed");
        }

        Ok(affected > 0)
    }

    fn deactivate_credential(&self, user_id: i64, service_name: &str) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        let affected = self.db.conn().execute(
            "UPDATE user_credentials
             SET is_active = 0, updated_at = ?3
             WHERE user_id = ?1 AND service_name = ?2 AND is_active = 1",
            params![user_id, service_name, now],
        )?;

        if affected > 0 {
            tracing::info!(user_id, service = service_name, "Credential deactivated");
        }

        Ok(affected > 0)
    }

    fn update_last_used(&self, user_id: i64, service_name: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.db.conn().execute(
            "UPDATE user_credentials
             SET last_used_at = ?3
             WHERE user_id = ?1 AND service_name = ?2",
            params![user_id, service_name, now],
        )?;

        tracing::debug!(user_id, service = service_name, "Usage timestamp updated");
        Ok(())
    }

    fn get_services_with_credentials(&self, user_id: i64) -> Result<BTreeSet<String>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT service_name FROM user_credentials
             WHERE user_id = ?1 AND is_active = 1",
        )?;

        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

        let mut services = BTreeSet::new();
        for row in rows {
            services.insert(row?);
        }

        Ok(services)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
