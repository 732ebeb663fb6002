//! # smev-crypto — Cryptographic Capability Layer
//!
//! The stack never implements cryptographic primitives; it defines the
//! exact byte sequences fed to a [`CryptoProvider`] and the structural
//! rules around the results. Two providers ship with the workspace:
//!
//! - [`OpensslProvider`] — shells out to an external `openssl` binary for
//!   the GOST R 34.11-94 / GOST R 34.10-2001 pair the protocol mandates.
//!   Key material crosses the process boundary through scoped temporary
//!   files that are removed on every exit path.
//! - [`Ed25519Provider`] — an in-process substitution (SHA-256 digests,
//!   Ed25519 signatures) for deterministic development and testing.
//!
//! ## Security Invariant
//!
//! - Private key material ([`KeyMaterial`]) is never serialized or logged;
//!   its `Debug` implementation is redacted.
//! - An engine failure is a [`CryptoProviderError`], never a verification
//!   result: callers can always distinguish "could not verify" from
//!   "verified false".

#![forbid(unsafe_code)]

pub mod ed25519;
pub mod error;
pub mod keys;
pub mod openssl;
pub mod pem;
pub mod provider;

pub use ed25519::Ed25519Provider;
pub use error::{CryptoProviderError, PemError};
pub use keys::KeyMaterial;
pub use openssl::OpensslProvider;
pub use provider::CryptoProvider;
