//! Server configuration from environment variables.
//!
//! The field-encryption key is loaded once here and never regenerated at runtime: a
//! fresh key would make every previously stored phone, email and card unreadable.

use crate::errors::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::net::SocketAddr;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Length of an AES-256 key in bytes.
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the API listens on
    pub bind_address: SocketAddr,
    /// Raw AES-256 key for field encryption
    pub encryption_key: [u8; ENCRYPTION_KEY_LEN],
}

impl ServerConfig {
    /// Reads `BIND_ADDRESS` (optional) and `ENCRYPTION_KEY` (required) from the environment.
    pub fn from_env() -> Result<Self> {
        let bind =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
        let key = std::env::var("ENCRYPTION_KEY").map_err(|_| Error::Config {
            message: "ENCRYPTION_KEY must be set to a base64-encoded 32-byte key".to_string(),
        })?;
        Self::from_parts(&bind, &key)
    }

    /// Builds the config from raw strings.
    pub fn from_parts(bind_address: &str, encryption_key_b64: &str) -> Result<Self> {
        let bind_address = bind_address.parse().map_err(|e| Error::Config {
            message: format!("Invalid BIND_ADDRESS '{bind_address}': {e}"),
        })?;
        Ok(Self {
            bind_address,
            encryption_key: decode_key(encryption_key_b64)?,
        })
    }
}

fn decode_key(encoded: &str) -> Result<[u8; ENCRYPTION_KEY_LEN]> {
    let bytes = STANDARD.decode(encoded.trim()).map_err(|e| Error::Config {
        message: format!("ENCRYPTION_KEY is not valid base64: {e}"),
    })?;
    bytes.try_into().map_err(|bytes: Vec<u8>| Error::Config {
        message: format!(
            "ENCRYPTION_KEY must decode to {ENCRYPTION_KEY_LEN} bytes, got {}",
            bytes.len()
        ),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_from_parts_accepts_valid_key() {
        let key = STANDARD.encode([7u8; ENCRYPTION_KEY_LEN]);
        let config = ServerConfig::from_parts("0.0.0.0:9000", &key).unwrap();
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.encryption_key, [7u8; ENCRYPTION_KEY_LEN]);
    }

    #[test]
    fn test_short_key_is_rejected() {
        let key = STANDARD.encode([1u8; 16]);
        let result = ServerConfig::from_parts(DEFAULT_BIND_ADDRESS, &key);
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_garbage_key_is_rejected() {
        let result = ServerConfig::from_parts(DEFAULT_BIND_ADDRESS, "not base64 !!!");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_bad_bind_address_is_rejected() {
        let key = STANDARD.encode([0u8; ENCRYPTION_KEY_LEN]);
        let result = ServerConfig::from_parts("localhost-ish", &key);
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }
}
