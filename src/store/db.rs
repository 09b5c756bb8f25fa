// Bulldozer Vault — Database Management
//
// Opens the SQLite database holding encrypted credential rows and runs the
// embedded schema migration. Payloads are encrypted before they reach this
// layer, so the database file itself never contains plaintext secrets.

use rusqlite::Connection;

use super::StoreError;

/// Wrapper around the vault's SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run schema migrations to create or update tables.
    ///
    /// The UNIQUE constraint over (user_id, service_name) is load-bearing: it
    /// is what guarantees at most one active row per pair even under
    /// concurrent adds, via the upsert in the repository.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS user_credentials (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id             INTEGER NOT NULL,
                service_name        TEXT NOT NULL,
                credential_type     TEXT NOT NULL,
                encrypted_payload   TEXT NOT NULL,
                is_active           INTEGER NOT NULL DEFAULT 1,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                last_used_at        TEXT,
                UNIQUE(user_id, service_name)
            );

            CREATE INDEX IF NOT EXISTS idx_user_credentials_user
                ON user_credentials(user_id);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
