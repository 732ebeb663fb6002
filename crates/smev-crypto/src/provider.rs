//! The `CryptoProvider` capability trait.

use crate::error::CryptoProviderError;
use crate::keys::KeyMaterial;

/// Cryptographic primitive capability consumed by the signing, verification
/// and attachment pipelines.
///
/// Implementations may block on an external process or native library call;
/// all three operations are synchronous. Providers hold no mutable state,
/// so call sites needing concurrency can invoke them from independent
/// threads (`Send + Sync` is part of the contract).
///
/// Every error of the underlying engine surfaces as
/// [`CryptoProviderError`]; in particular, `verify` reports an invalid
/// signature as `Ok(false)` and reserves `Err(_)` for engine failure.
pub trait CryptoProvider: Send + Sync {
    /// Deterministic keyless content digest, returned as base64 text.
    fn digest(&self, data: &[u8]) -> Result<String, CryptoProviderError>;

    /// Signature over `data` with the supplied private key material,
    /// returned as base64 text.
    fn sign(&self, data: &[u8], key: &KeyMaterial) -> Result<String, CryptoProviderError>;

    /// Verify `signature` (base64 text) over `data` against the public key
    /// carried by `certificate_der`.
    fn verify(
        &self,
        data: &[u8],
        certificate_der: &[u8],
        signature: &str,
    ) -> Result<bool, CryptoProviderError>;
}
