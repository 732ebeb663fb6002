//! Error types of the cryptographic capability layer.

use thiserror::Error;

/// Failure of the underlying primitive engine or of the data handed to it.
///
/// Distinct from a negative verification result: `verify` returns
/// `Ok(false)` for an invalid signature and `Err(_)` when the engine
/// itself could not run. Callers may retry transient engine failures;
/// they must never treat one as "signature invalid".
#[derive(Error, Debug)]
pub enum CryptoProviderError {
    /// The primitive engine signalled an error.
    #[error("crypto engine failure: {0}")]
    Engine(String),

    /// Key or certificate material could not be loaded.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// A signature value was not decodable.
    #[error("malformed signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    /// I/O towards the engine failed.
    #[error("i/o error talking to crypto engine: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PemError> for CryptoProviderError {
    fn from(err: PemError) -> Self {
        CryptoProviderError::InvalidKeyMaterial(err.to_string())
    }
}

/// Malformed PEM container.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PemError {
    /// One or both of the literal BEGIN/END markers are absent.
    #[error("PEM container has no {0} markers (BEGIN, END)")]
    MissingMarkers(&'static str),

    /// The container is not text.
    #[error("PEM container is not valid UTF-8")]
    NotText,
}
