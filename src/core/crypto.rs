//! Field encryption for contact and payment data.
//!
//! Values are sealed with AES-256-GCM under a random 96-bit nonce and stored as
//! `base64(nonce || ciphertext)`. Decryption never fails the caller: rows written before
//! encryption was introduced hold plain text, and those are returned unchanged.

use crate::config::server::ENCRYPTION_KEY_LEN;
use crate::errors::{Error, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::debug;

const NONCE_LEN: usize = 12;

/// Symmetric cipher for columns that must be encrypted at rest.
///
/// Built once at startup from the configured key and shared behind an `Arc`.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Creates a cipher from a raw 256-bit key.
    #[must_use]
    pub fn new(key: &[u8; ENCRYPTION_KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Encrypts `plaintext`. Empty input stays empty so "not set" survives the round trip.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::Crypto {
                message: "failed to encrypt field".to_string(),
            })?;

        let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&sealed);
        Ok(STANDARD.encode(payload))
    }

    /// Decrypts a stored value, falling back to the stored text when it is not a
    /// ciphertext produced by this key.
    #[must_use]
    pub fn decrypt(&self, stored: &str) -> String {
        if stored.is_empty() {
            return String::new();
        }
        self.try_decrypt(stored).unwrap_or_else(|| {
            debug!("Field is not decryptable, returning stored value");
            stored.to_string()
        })
    }

    fn try_decrypt(&self, stored: &str) -> Option<String> {
        let payload = STANDARD.decode(stored).ok()?;
        if payload.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, sealed) = payload.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .ok()?;
        String::from_utf8(plain).ok()
    }
}
