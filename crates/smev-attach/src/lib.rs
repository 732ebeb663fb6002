//! # smev-attach — Attachment Bundles
//!
//! Packages a directory of files into the transportable archive the
//! interchange protocol expects, and unpacks such archives with integrity
//! checking.
//!
//! Every file is bound into the bundle twice over:
//!
//! - the manifest records `digest(content)` for the file itself, and
//!   `digest(digest(content))` for a synthetic `.sig` entry whose archive
//!   payload is the content digest text — a derived integrity artifact,
//!   not a cryptographic signature;
//! - the manifest's own bytes are digested into `req_<id>.sig`.
//!
//! Authenticity of the bundle as a whole comes from the enclosing document
//! signature in the full protocol flow; the per-file digests provide
//! tamper evidence only. The two-level scheme is mandated and must not be
//! "upgraded" to per-file signatures.

#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod manifest;

pub use codec::{encode_directory, extract_directory, EncodedAttachments, ExtractOptions};
pub use error::AttachmentError;
pub use manifest::{AppliedDocument, Manifest};
