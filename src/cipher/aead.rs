// Bulldozer Vault — Credential Cipher
//
// Authenticated encryption of structured credential payloads with AES-256-GCM.
// The symmetric key is read once from the environment at startup and held for
// the lifetime of the process; it never appears in logs or error messages.
//
// Ciphertext blob format (safe for a TEXT column):
//   v1:<base64 nonce>:<base64 ciphertext>

use std::collections::BTreeMap;
use std::env;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroizing;

use super::CipherError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Environment variable holding the base64-encoded 256-bit key.
pub const KEY_ENV_VAR: &str = "CREDENTIAL_ENCRYPTION_KEY";

/// Length of the symmetric key in bytes (AES-256).
const KEY_LEN: usize = 32;

/// Length of the AES-GCM nonce in bytes (96-bit, per NIST SP 800-38D).
const NONCE_LEN: usize = 12;

/// Version tag prefixed to every ciphertext blob.
const BLOB_VERSION: &str = "v1";

// ─── Cipher ──────────────────────────────────────────────────────────────────

/// Encrypts and decrypts credential payloads (string-to-string mappings).
///
/// Holds only the derived AES key; no per-operation state, so a single
/// instance is safely shared by reference across concurrent callers.
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// Construct from raw key material. The key must be exactly 32 bytes.
    pub fn new(key_bytes: &[u8]) -> Result<Self, CipherError> {
        if key_bytes.len() != KEY_LEN {
            return Err(CipherError::Configuration(format!(
                "key must be {} bytes, got {}",
                KEY_LEN,
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Construct from the `CREDENTIAL_ENCRYPTION_KEY` environment variable.
    /// A missing or malformed key is fatal — the vault cannot operate without it.
    pub fn from_env() -> Result<Self, CipherError> {
        let encoded = env::var(KEY_ENV_VAR).map_err(|_| {
            CipherError::Configuration(format!(
                "{} not set — generate one with `bulldozer-vault gen-key`",
                KEY_ENV_VAR
            ))
        })?;

        let key_bytes = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|_| {
            CipherError::Configuration(format!("{} is not valid base64", KEY_ENV_VAR))
        })?);

        Self::new(&key_bytes)
    }

    /// Generate a fresh random key, base64-encoded for the environment.
    pub fn generate_key() -> String {
        let mut key = Zeroizing::new(vec![0u8; KEY_LEN]);
        rand::rng().fill_bytes(&mut key);
        BASE64.encode(key.as_slice())
    }

    /// Encrypt a credential payload into an opaque storage string.
    ///
    /// A fresh random nonce is drawn per call, so ciphertexts are not
    /// reproducible across calls even for identical payloads.
    pub fn encrypt(&self, payload: &BTreeMap<String, String>) -> Result<String, CipherError> {
        let plaintext = Zeroizing::new(serde_json::to_vec(payload)?);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|_| CipherError::Encryption)?;

        Ok(format!(
            "{}:{}:{}",
            BLOB_VERSION,
            BASE64.encode(nonce_bytes),
            BASE64.encode(&ciphertext)
        ))
    }

    /// Authenticate and decrypt a blob produced by `encrypt`.
    ///
    /// Any malformed framing, base64 error, authentication-tag mismatch, or
    /// post-decrypt deserialization failure collapses into a single
    /// `CipherError::Decryption` — no partial data is ever returned.
    pub fn decrypt(&self, blob: &str) -> Result<BTreeMap<String, String>, CipherError> {
        let mut parts = blob.splitn(3, ':');
        let (version, nonce_b64, ciphertext_b64) =
            match (parts.next(), parts.next(), parts.next()) {
                (Some(v), Some(n), Some(c)) => (v, n, c),
                _ => return Err(CipherError::Decryption),
            };

        if version != BLOB_VERSION {
            return Err(CipherError::Decryption);
        }

        let nonce_bytes = BASE64
            .decode(nonce_b64)
            .map_err(|_| CipherError::Decryption)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CipherError::Decryption);
        }

        let ciphertext = BASE64
            .decode(ciphertext_b64)
            .map_err(|_| CipherError::Decryption)?;

        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
                .map_err(|_| CipherError::Decryption)?,
        );

        serde_json::from_slice(&plaintext).map_err(|_| CipherError::Decryption)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> CredentialCipher {
        CredentialCipher::new(&[7u8; KEY_LEN]).unwrap()
    }

    fn sample_payload() -> BTreeMap<String, String> {
        let mut payload = BTreeMap::new();
        payload.insert("api_key".to_string(), "abc123".to_string());
        payload
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let cipher = test_cipher();
        let payload = sample_payload();

        let blob = cipher.encrypt(&payload).unwrap();
        let decrypted = cipher.decrypt(&blob).unwrap();

        assert_eq!(decrypted, payload);
    }

    #[test]
    fn test_round_trip_multi_field_payload() {
        let cipher = test_cipher();
        let mut payload = BTreeMap::new();
        payload.insert("username".to_string(), "user@example.com".to_string());
        payload.insert("password".to_string(), "hunter2:with:colons".to_string());

        let blob = cipher.encrypt(&payload).unwrap();
        assert_eq!(cipher.decrypt(&blob).unwrap(), payload);
    }

    #[test]
    fn test_ciphertext_never_contains_plaintext() {
        let cipher = test_cipher();
        let blob = cipher.encrypt(&sample_payload()).unwrap();
        assert!(!blob.contains("abc123"), "blob must not leak the secret");
        assert!(!blob.contains("api_key"), "blob must not leak field names");
    }

    #[test]
    fn test_ciphertext_not_reproducible() {
        let cipher = test_cipher();
        let payload = sample_payload();
        let a = cipher.encrypt(&payload).unwrap();
        let b = cipher.encrypt(&payload).unwrap();
        assert_ne!(a, b, "fresh nonce per call must vary the ciphertext");
    }

    #[test]
    fn test_tampering_any_ciphertext_byte_fails() {
        let cipher = test_cipher();
        let blob = cipher.encrypt(&sample_payload()).unwrap();

        let parts: Vec<&str> = blob.splitn(3, ':').collect();
        let mut ciphertext = BASE64.decode(parts[2]).unwrap();

        for i in 0..ciphertext.len() {
            ciphertext[i] ^= 0x01;
            let tampered = format!("{}:{}:{}", parts[0], parts[1], BASE64.encode(&ciphertext));
            assert!(
                matches!(cipher.decrypt(&tampered), Err(CipherError::Decryption)),
                "flipping byte {} must fail authentication",
                i
            );
            ciphertext[i] ^= 0x01;
        }
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let cipher = test_cipher();
        let blob = cipher.encrypt(&sample_payload()).unwrap();

        let parts: Vec<&str> = blob.splitn(3, ':').collect();
        let mut nonce = BASE64.decode(parts[1]).unwrap();
        nonce[0] ^= 0xff;
        let tampered = format!("{}:{}:{}", parts[0], BASE64.encode(&nonce), parts[2]);

        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(CipherError::Decryption)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher_a = CredentialCipher::new(&[1u8; KEY_LEN]).unwrap();
        let cipher_b = CredentialCipher::new(&[2u8; KEY_LEN]).unwrap();

        let blob = cipher_a.encrypt(&sample_payload()).unwrap();
        assert!(matches!(
            cipher_b.decrypt(&blob),
            Err(CipherError::Decryption)
        ));
    }

    #[test]
    fn test_malformed_blobs_fail_uniformly() {
        let cipher = test_cipher();

        for blob in [
            "",
            "garbage",
            "v1:only-two-parts",
            "v2:AAAA:BBBB",
            "v1:not base64!:BBBB",
            "v1:AAAA:not base64!",
            "v1:AAAA:AAAA", // nonce too short
        ] {
            assert!(
                matches!(cipher.decrypt(blob), Err(CipherError::Decryption)),
                "blob {:?} must fail with Decryption",
                blob
            );
        }
    }

    #[test]
    fn test_truncated_blob_fails() {
        let cipher = test_cipher();
        let blob = cipher.encrypt(&sample_payload()).unwrap();
        let truncated = &blob[..blob.len() - 4];
        assert!(matches!(
            cipher.decrypt(truncated),
            Err(CipherError::Decryption)
        ));
    }

    #[test]
    fn test_generate_key_is_valid_and_random() {
        let a = CredentialCipher::generate_key();
        let b = CredentialCipher::generate_key();
        assert_ne!(a, b);

        let decoded = BASE64.decode(&a).unwrap();
        assert_eq!(decoded.len(), KEY_LEN);

        // A generated key must be directly usable
        CredentialCipher::new(&decoded).unwrap();
    }

    #[test]
    fn test_new_rejects_wrong_key_length() {
        assert!(matches!(
            CredentialCipher::new(&[0u8; 16]),
            Err(CipherError::Configuration(_))
        ));
    }

    // Single test for all env-var states to avoid races between parallel tests
    // mutating the same process environment.
    #[test]
    fn test_from_env_lifecycle() {
        env::remove_var(KEY_ENV_VAR);
        assert!(matches!(
            CredentialCipher::from_env(),
            Err(CipherError::Configuration(_))
        ));

        env::set_var(KEY_ENV_VAR, "!!not-base64!!");
        assert!(matches!(
            CredentialCipher::from_env(),
            Err(CipherError::Configuration(_))
        ));

        env::set_var(KEY_ENV_VAR, BASE64.encode([9u8; 8]));
        assert!(matches!(
            CredentialCipher::from_env(),
            Err(CipherError::Configuration(_))
        ));

        env::set_var(KEY_ENV_VAR, CredentialCipher::generate_key());
        let cipher = CredentialCipher::from_env().unwrap();
        let payload = sample_payload();
        let blob = cipher.encrypt(&payload).unwrap();
        assert_eq!(cipher.decrypt(&blob).unwrap(), payload);

        env::remove_var(KEY_ENV_VAR);
    }
}
