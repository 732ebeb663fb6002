//! Attachment-layer error types.

use smev_crypto::error::CryptoProviderError;
use thiserror::Error;

/// Failure while encoding or extracting an attachment bundle.
#[derive(Error, Debug)]
pub enum AttachmentError {
    /// The transport payload is not valid base64.
    #[error("attachment payload is not valid base64: {0}")]
    Encoding(String),

    /// The ZIP container is unreadable or unwritable.
    #[error("archive error: {0}")]
    Archive(String),

    /// The manifest named by the request code is absent from the archive.
    #[error("manifest file \"{0}\" not found in archive")]
    ManifestNotFound(String),

    /// The manifest exists but cannot be interpreted.
    #[error("malformed manifest: {0}")]
    ManifestFormat(String),

    /// An extracted file's digest does not match the manifest record.
    #[error("digest mismatch for \"{path}\": expected {expected}, got {actual}")]
    FileDigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// An archive entry would escape the destination directory.
    #[error("unsafe entry path in archive: {0}")]
    UnsafeEntryPath(String),

    /// The digest engine failed.
    #[error("crypto provider error: {0}")]
    Provider(#[from] CryptoProviderError),

    /// Filesystem access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
