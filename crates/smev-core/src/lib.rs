//! # smev-core — Foundational Types for the SMEV Interchange Stack
//!
//! This crate is the bedrock of the workspace. It defines the protocol
//! constant tables, the typed XML tree-builder, the exclusive
//! canonicalization pipeline, and the structural lookup helpers used by
//! every other crate. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalXml` newtype.** ALL digest and signature input flows
//!    through `CanonicalXml::of_node()`. No raw serialization for digests.
//!    Ever. This prevents the canonicalization split defect class by
//!    construction.
//!
//! 2. **Typed XML construction.** `XmlElement` replaces stringly-typed
//!    document assembly: tagged content (text scalar or ordered element
//!    list), namespace prefixes scoped per element and inherited only when
//!    requested, declarations resolved against the fixed protocol table.
//!
//! 3. **Read-only constant tables.** Namespace URIs, element names, and
//!    algorithm identifiers are process-wide `&'static str` constants; no
//!    lifecycle management, no mutation.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `smev-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

#![forbid(unsafe_code)]

pub mod canonical;
pub mod document;
pub mod error;
pub mod ns;
pub mod xml;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalXml;
pub use error::{CanonicalizationError, XmlError};
pub use xml::{XmlAttr, XmlContent, XmlElement};
