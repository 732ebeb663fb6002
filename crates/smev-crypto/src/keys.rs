//! Key material: a PEM container (certificate + private key) plus the
//! passphrase protecting the key.

use std::path::Path;

use crate::error::{CryptoProviderError, PemError};
use crate::pem;

/// Private signing material.
///
/// Does not implement `Serialize`, and `Debug` is redacted — key material
/// must not leak into logs, responses, or artifacts. The certificate
/// payload is the only part that ends up inside a persisted document.
#[derive(Clone)]
pub struct KeyMaterial {
    pem: Vec<u8>,
    passphrase: String,
}

impl KeyMaterial {
    /// Wrap in-memory PEM container bytes.
    pub fn from_pem_bytes(pem: impl Into<Vec<u8>>, passphrase: impl Into<String>) -> Self {
        Self {
            pem: pem.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Read a PEM container from disk.
    pub fn from_pem_file(
        path: impl AsRef<Path>,
        passphrase: impl Into<String>,
    ) -> Result<Self, CryptoProviderError> {
        let pem = std::fs::read(path)?;
        Ok(Self::from_pem_bytes(pem, passphrase))
    }

    /// Base64 certificate payload for the BinarySecurityToken.
    pub fn certificate_payload(&self) -> Result<String, PemError> {
        pem::extract_certificate_payload(&self.pem)
    }

    /// Base64 private-key payload (used by in-process providers).
    pub fn private_key_payload(&self) -> Result<String, PemError> {
        pem::extract_private_key_payload(&self.pem)
    }

    /// Raw PEM container bytes (for providers that exchange keys on disk).
    pub fn pem_bytes(&self) -> &[u8] {
        &self.pem
    }

    /// Passphrase protecting the private key.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial(<private>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_leak() {
        let key = KeyMaterial::from_pem_bytes(b"secret bytes".to_vec(), "hunter2");
        let debug = format!("{key:?}");
        assert_eq!(debug, "KeyMaterial(<private>)");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_certificate_payload_forwarded() {
        let pem = "-----BEGIN CERTIFICATE-----\nQUJD\n-----END CERTIFICATE-----\n";
        let key = KeyMaterial::from_pem_bytes(pem.as_bytes().to_vec(), "");
        assert_eq!(key.certificate_payload().unwrap(), "QUJD");
    }
}
