//! AES-256-GCM sealing for credentials stored at rest.
//!
//! Sealed values are base64 of `nonce || ciphertext`.
use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{bail, Context, Result};
use base64::Engine;
use rand::RngCore;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SecretCipher")
            .field("cipher", &"configured")
            .finish()
    }
}

impl SecretCipher {
    /// Builds a cipher from a base64 encoded 32 byte key.
    ///
    /// # Errors
    /// Returns an error if the key is not base64 or has the wrong length.
    pub fn from_base64_key(raw_key: &str) -> Result<Self> {
        let key_bytes = base64::engine::general_purpose::STANDARD
            .decode(raw_key.trim())
            .context("secret key must be base64")?;
        if key_bytes.len() != KEY_LEN {
            bail!("secret key must decode to {KEY_LEN} bytes")
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes).context("invalid secret key")?;
        Ok(Self { cipher })
    }

    /// # Errors
    /// Returns an error if encryption fails.
    pub fn encrypt(&self, value: &str) -> Result<String> {
        let mut nonce_bytes = [0_u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, value.as_bytes())
            .map_err(|_| anyhow::anyhow!("encryption failed"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(combined))
    }

    /// # Errors
    /// Returns an error if the value is malformed or was sealed with another key.
    pub fn decrypt(&self, encrypted_value: &str) -> Result<String> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encrypted_value)?;
        if bytes.len() <= NONCE_LEN {
            bail!("encrypted value malformed")
        }

        let nonce = Nonce::from_slice(&bytes[..NONCE_LEN]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &bytes[NONCE_LEN..])
            .map_err(|_| anyhow::anyhow!("decryption failed"))?;
        String::from_utf8(plaintext).context("decrypted value is not utf8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
    const KEY_B: &str = "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=";

    #[test]
    fn encrypt_then_decrypt_returns_original() {
        let cipher = SecretCipher::from_base64_key(KEY_A).expect("cipher");
        let sealed = cipher.encrypt("jira-api-token").expect("encrypt");

        assert_ne!(sealed, "jira-api-token");
        assert_eq!(cipher.decrypt(&sealed).expect("decrypt"), "jira-api-token");
    }

    #[test]
    fn encrypt_uses_fresh_nonce_each_time() {
        let cipher = SecretCipher::from_base64_key(KEY_A).expect("cipher");
        let first = cipher.encrypt("same").expect("encrypt");
        let second = cipher.encrypt("same").expect("encrypt");
        assert_ne!(first, second);
    }

    #[test]
    fn decrypt_rejects_other_key_and_malformed_input() {
        let sealed = SecretCipher::from_base64_key(KEY_A)
            .expect("cipher")
            .encrypt("secret")
            .expect("encrypt");
        let other = SecretCipher::from_base64_key(KEY_B).expect("cipher");

        assert!(other.decrypt(&sealed).is_err());
        assert!(other.decrypt("AAAA").is_err());
        assert!(other.decrypt("not base64!").is_err());
    }

    #[test]
    fn from_base64_key_rejects_bad_keys() {
        assert!(SecretCipher::from_base64_key("not base64!").is_err());
        assert!(SecretCipher::from_base64_key("AAAA").is_err());
    }
}
