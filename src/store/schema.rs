// Bulldozer Vault — Per-service payload schemas
//
// Declares which fields a service's credential payload must carry. Services
// without a registered shape are accepted unconditionally, so new providers
// can be onboarded without touching the vault.

use std::collections::{BTreeMap, HashMap};

use super::StoreError;

/// The expected shape of a service's credential payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialShape {
    /// A single API key: `{"api_key"}`.
    SingleSecret,
    /// Basic-auth style: `{"username", "password"}`.
    UsernamePassword,
    /// OAuth style: `{"token", "refresh_token"}`.
    TokenPair,
}

impl CredentialShape {
    /// Field names that must be present in the payload.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            CredentialShape::SingleSecret => &["api_key"],
            CredentialShape::UsernamePassword => &["username", "password"],
            CredentialShape::TokenPair => &["token", "refresh_token"],
        }
    }
}

/// Registry mapping service names to their expected payload shape.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    shapes: HashMap<String, CredentialShape>,
}

impl SchemaRegistry {
    /// An empty registry: every service validates unconditionally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the data providers the assistant integrates.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("osha_api", CredentialShape::SingleSecret);
        registry.register("dol_efast", CredentialShape::UsernamePassword);
        registry.register("pacer", CredentialShape::UsernamePassword);
        registry.register("fec_api", CredentialShape::SingleSecret);
        registry.register("opencorporates", CredentialShape::SingleSecret);
        registry.register("newsapi", CredentialShape::SingleSecret);
        registry.register("propublica", CredentialShape::SingleSecret);
        registry.register("sam_gov", CredentialShape::SingleSecret);
        registry
    }

    /// Register (or replace) the shape for a service at runtime.
    pub fn register(&mut self, service_name: impl Into<String>, shape: CredentialShape) {
        self.shapes.insert(service_name.into(), shape);
    }

    /// Look up the declared shape for a service, if any.
    pub fn shape(&self, service_name: &str) -> Option<CredentialShape> {
        self.shapes.get(service_name).copied()
    }

    /// Check a payload against the declared shape for `service_name`.
    ///
    /// Unknown services pass unconditionally. Extra fields beyond the
    /// required set are allowed — shapes declare a minimum, not an exact set.
    pub fn validate(
        &self,
        service_name: &str,
        payload: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let Some(shape) = self.shape(service_name) else {
            return Ok(());
        };

        let missing: Vec<String> = shape
            .required_fields()
            .iter()
            .filter(|field| !payload.contains_key(**field))
            .map(|field| field.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation {
                service: service_name.to_string(),
                missing,
            })
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_secret_accepts_api_key() {
        let registry = SchemaRegistry::with_defaults();
        assert!(registry
            .validate("osha_api", &payload(&[("api_key", "abc123")]))
            .is_ok());
    }

    #[test]
    fn test_single_secret_rejects_wrong_field() {
        let registry = SchemaRegistry::with_defaults();
        let err = registry
            .validate("osha_api", &payload(&[("username", "x")]))
            .unwrap_err();

        match err {
            StoreError::Validation { service, missing } => {
                assert_eq!(service, "osha_api");
                assert_eq!(missing, vec!["api_key".to_string()]);
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_username_password_reports_all_missing_fields() {
        let registry = SchemaRegistry::with_defaults();
        let err = registry
            .validate("pacer", &payload(&[]))
            .unwrap_err();

        match err {
            StoreError::Validation { missing, .. } => {
                assert_eq!(
                    missing,
                    vec!["username".to_string(), "password".to_string()]
                );
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_fields_are_allowed() {
        let registry = SchemaRegistry::with_defaults();
        assert!(registry
            .validate(
                "dol_efast",
                &payload(&[("username", "u"), ("password", "p"), ("note", "work acct")])
            )
            .is_ok());
    }

    #[test]
    fn test_unknown_service_accepts_any_payload() {
        let registry = SchemaRegistry::with_defaults();
        assert!(registry
            .validate("some_future_provider", &payload(&[("whatever", "x")]))
            .is_ok());
        assert!(registry.validate("some_future_provider", &payload(&[])).is_ok());
    }

    #[test]
    fn test_runtime_registration() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.validate("courtlistener", &payload(&[])).is_ok());

        registry.register("courtlistener", CredentialShape::TokenPair);
        assert!(registry.validate("courtlistener", &payload(&[])).is_err());
        assert!(registry
            .validate(
                "courtlistener",
                &payload(&[("token", "t"), ("refresh_token", "r")])
            )
            .is_ok());
    }

    #[test]
    fn test_defaults_cover_expected_services() {
        let registry = SchemaRegistry::with_defaults();
        assert_eq!(
            registry.shape("dol_efast"),
            Some(CredentialShape::UsernamePassword)
        );
        assert_eq!(registry.shape("fec_api"), Some(CredentialShape::SingleSecret));
        assert_eq!(registry.shape("unheard_of"), None);
    }
}
