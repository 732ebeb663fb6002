//! Envelope-layer error types.

use smev_core::error::{CanonicalizationError, XmlError};
use smev_crypto::error::{CryptoProviderError, PemError};
use thiserror::Error;

use crate::skeleton::SmevVersion;

/// Required element absent from a document under verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingElement {
    Body,
    DigestValue,
    BinarySecurityToken,
    SignedInfo,
    SignatureValue,
}

impl MissingElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "Body",
            Self::DigestValue => "DigestValue",
            Self::BinarySecurityToken => "BinarySecurityToken",
            Self::SignedInfo => "SignedInfo",
            Self::SignatureValue => "SignatureValue",
        }
    }
}

impl std::fmt::Display for MissingElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification failure. A digest or signature that simply does not match
/// is NOT an error — `verify_envelope` returns `Ok(false)` for that; these
/// variants cover structural and engine faults only.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// A required element is absent — a structural fault, not a negative
    /// verification result.
    #[error("required element missing from signed document: {0}")]
    MissingElement(MissingElement),

    /// The document is not parseable XML.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Canonical form of a subtree could not be produced.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The primitive engine failed — distinct from "signature invalid".
    #[error("crypto provider error: {0}")]
    Provider(#[from] CryptoProviderError),
}

/// Envelope construction, signing and reshaping failure.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Typed XML construction or serialization failed.
    #[error("xml error: {0}")]
    Xml(#[from] XmlError),

    /// Canonical form of a subtree could not be produced.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The primitive engine failed.
    #[error("crypto provider error: {0}")]
    Provider(#[from] CryptoProviderError),

    /// The key container is malformed.
    #[error("key material error: {0}")]
    Pem(#[from] PemError),

    /// An element the operation relies on is absent.
    #[error("envelope is missing required element: {0}")]
    MissingElement(&'static str),

    /// The context's service block does not fit the requested version.
    #[error("service block does not match message version {0}")]
    ServiceMismatch(SmevVersion),

    /// No registered conversion between the two protocol versions.
    #[error("no conversion path from {from} to {to}")]
    UnsupportedConversion { from: SmevVersion, to: SmevVersion },

    /// The document is structurally unusable.
    #[error("malformed envelope: {0}")]
    Malformed(String),
}
