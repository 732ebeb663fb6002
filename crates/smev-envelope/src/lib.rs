//! # smev-envelope — Signed SOAP Envelope Layer
//!
//! Builds, signs, verifies and reshapes SMEV SOAP envelopes.
//!
//! The signing path is a state machine exposed as one immutable transform:
//! `Unsigned → HeaderAttached → DigestComputed → Signed`, with the caller's
//! input never mutated — [`sign_envelope`] returns a new, fully-formed
//! [`SignedDocument`]. A document that already carries a security header is
//! treated as `Signed` and passed through untouched; this subsystem never
//! re-signs.
//!
//! Verification re-derives the canonical digest and signature inputs from
//! a received document and asks the [`CryptoProvider`] to confirm both.
//! Structural faults (a missing body, digest value, token, signed-info or
//! signature value) are typed errors, never boolean results.
//!
//! [`CryptoProvider`]: smev_crypto::CryptoProvider

#![forbid(unsafe_code)]

pub mod convert;
pub mod document;
pub mod error;
pub mod header;
pub mod reply;
pub mod skeleton;
pub mod verify;

pub use convert::convert_envelope;
pub use document::SignedDocument;
pub use error::{EnvelopeError, MissingElement, VerifyError};
pub use header::sign_envelope;
pub use reply::construct_error_reply;
pub use skeleton::{
    construct_envelope, construct_envelope_with_app_data, extract_context, Agency, AppDocument,
    MessageContext, ServiceId, SmevVersion, Status, TypeCode,
};
pub use verify::verify_envelope;
