// Bulldozer Vault — CLI Command Handlers
//
// Each function handles one CLI subcommand. This is the composition root:
// the cipher is built once from the environment and handed to the store by
// reference. Secret values are never echoed back to the terminal.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cipher::CredentialCipher;
use crate::error::VaultError;
use crate::store::{CredentialType, CredentialVault, Database, SqliteCredentialVault};

use super::Commands;

/// Default directory for vault data files.
fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("bulldozer-vault")
}

/// Path to the database file.
fn db_path() -> PathBuf {
    data_dir().join("credentials.db")
}

fn open_db() -> Result<Database, VaultError> {
    std::fs::create_dir_all(data_dir())?;
    Ok(Database::open(&db_path())?)
}

/// Parse `KEY=VALUE` arguments into a payload mapping.
fn parse_fields(fields: &[String]) -> Result<BTreeMap<String, String>, VaultError> {
    let mut payload = BTreeMap::new();
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(VaultError::Other(format!(
                "Invalid field '{}': expected KEY=VALUE",
                field
            )));
        };
        payload.insert(key.trim().to_string(), value.to_string());
    }
    Ok(payload)
}

/// Execute the parsed CLI command.
pub fn execute(command: Commands) -> Result<(), VaultError> {
    match command {
        Commands::GenKey => cmd_gen_key(),
        Commands::Add {
            user,
            service,
            credential_type,
            fields,
        } => cmd_add(user, service, credential_type, fields),
        Commands::List { user, all } => cmd_list(user, all),
        Commands::Services { user } => cmd_services(user),
        Commands::Test { user, service } => cmd_test(user, service),
        Commands::Deactivate { user, service } => cmd_deactivate(user, service),
        Commands::Remove { user, service } => cmd_remove(user, service),
    }
}

fn cmd_gen_key() -> Result<(), VaultError> {
    println!("{}", CredentialCipher::generate_key());
    eprintln!(
        "Export this as {} before running any other command.",
        crate::cipher::KEY_ENV_VAR
    );
    Ok(())
}

fn cmd_add(
    user: i64,
    service: String,
    credential_type: CredentialType,
    fields: Vec<String>,
) -> Result<(), VaultError> {
    let payload = parse_fields(&fields)?;

    let cipher = CredentialCipher::from_env()?;
    let db = open_db()?;
    let vault = SqliteCredentialVault::new(&db, &cipher);

    let summary = vault.add_credential(user, &service, credential_type, &payload)?;
    println!(
        "✓ {} credential stored for user {} ({})",
        summary.service_name, summary.user_id, summary.credential_type
    );
    Ok(())
}

fn cmd_list(user: i64, all: bool) -> Result<(), VaultError> {
    let cipher = CredentialCipher::from_env()?;
    let db = open_db()?;
    let vault = SqliteCredentialVault::new(&db, &cipher);

    let summaries = vault.get_all_credentials(user, !all)?;

    if summaries.is_empty() {
        println!("No credentials configured for user {}", user);
        return Ok(());
    }

    for summary in summaries {
        let last_used = summary
            .last_used_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<20} {:<12} {:<9} added {}  last used {}",
            summary.service_name,
            summary.credential_type,
            if summary.is_active { "active" } else { "inactive" },
            summary.created_at.format("%Y-%m-%d"),
            last_used
        );
    }
    Ok(())
}

fn cmd_services(user: i64) -> Result<(), VaultError> {
    let cipher = CredentialCipher::from_env()?;
    let db = open_db()?;
    let vault = SqliteCredentialVault::new(&db, &cipher);

    let services = vault.get_services_with_credentials(user)?;

    if services.is_empty() {
        println!("User {} has no usable credentials", user);
    } else {
        for service in services {
            println!("{}", service);
        }
    }
    Ok(())
}

fn cmd_test(user: i64, service: String) -> Result<(), VaultError> {
    let cipher = CredentialCipher::from_env()?;
    let db = open_db()?;
    let vault = SqliteCredentialVault::new(&db, &cipher);

    // Decrypt-check only: the payload itself is never printed, and a test
    // is not a use, so last_used_at stays untouched.
    match vault.get_credential_decrypted(user, &service)? {
        Some(_) => {
            println!("✓ {} credential decrypts cleanly", service);
        }
        None => {
            // Covers both "never configured" and "deactivated after a failed
            // decrypt" — the remedy is the same either way.
            println!(
                "✗ No usable {} credential for user {} — add one with `bulldozer-vault add`",
                service, user
            );
        }
    }
    Ok(())
}

fn cmd_deactivate(user: i64, service: String) -> Result<(), VaultError> {
    let cipher = CredentialCipher::from_env()?;
    let db = open_db()?;
    let vault = SqliteCredentialVault::new(&db, &cipher);

    if vault.deactivate_credential(user, &service)? {
        println!("✓ {} credential deactivated for user {}", service, user);
    } else {
        println!("No active {} credential for user {}", service, user);
    }
    Ok(())
}

fn cmd_remove(user: i64, service: String) -> Result<(), VaultError> {
    let cipher = CredentialCipher::from_env()?;
    let db = open_db()?;
    let vault = SqliteCredentialVault::new(&db, &cipher);

    if vault.remove_credential(user, &service)? {
        println!("✓ {} credential removed for user {}", service, user);
    } else {
        println!("No {} credential found for user {}", service, user);
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_single_pair() {
        let payload = parse_fields(&["api_key=sk_123".to_string()]).unwrap();
        assert_eq!(payload["api_key"], "sk_123");
    }

    #[test]
    fn test_parse_fields_value_may_contain_equals() {
        let payload = parse_fields(&["token=abc=def==".to_string()]).unwrap();
        assert_eq!(payload["token"], "abc=def==");
    }

    #[test]
    fn test_parse_fields_trims_key_not_value() {
        let payload = parse_fields(&[" password=  s3cret ".to_string()]).unwrap();
        assert_eq!(payload["password"], "  s3cret ");
    }

    #[test]
    fn test_parse_fields_rejects_bare_word() {
        assert!(parse_fields(&["api_key".to_string()]).is_err());
    }
}
