//! Directory ↔ archive codec.
//!
//! Encoding walks the directory depth-first in sorted order, digests every
//! file, derives the paired signature-file digest, and packages files,
//! derived digests, the manifest and the manifest digest into an in-memory
//! ZIP that is base64-encoded for transport. Extraction reverses the
//! process and re-verifies every recorded digest.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use smev_crypto::CryptoProvider;
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::AttachmentError;
use crate::manifest::{
    AppliedDocument, Manifest, CODE_DOCUMENT_PLACEHOLDER, OCTET_STREAM, SIG_MIME_TYPE,
};

/// Result of encoding a directory: the generated request code and the
/// base64 archive payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAttachments {
    pub request_code: String,
    pub payload: String,
}

/// Extraction behavior switches.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Where to unpack; a fresh temporary directory when absent. The
    /// destination is owned by the caller either way.
    pub destination: Option<PathBuf>,
    /// Recompute and compare every extracted file's digest.
    pub verify: bool,
    /// Skip derived `.sig` entries — digests are checked against the
    /// manifest, so the duplicates are rarely wanted on disk.
    pub exclude_sigs: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            destination: None,
            verify: true,
            exclude_sigs: true,
        }
    }
}

/// Encode a directory into a transportable attachment bundle.
///
/// Every file contributes two manifest records (itself and the derived
/// `.sig` entry) and two archive entries; after the walk the manifest is
/// serialized as `req_<id>.xml` with its digest in `req_<id>.sig`.
pub fn encode_directory(
    directory: impl AsRef<Path>,
    provider: &dyn CryptoProvider,
) -> Result<EncodedAttachments, AttachmentError> {
    let directory = directory.as_ref();
    let request_code = Uuid::new_v4().to_string();
    let mut documents = Vec::new();
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut number = 1u32;

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(directory)
            .map_err(|_| AttachmentError::UnsafeEntryPath(entry.path().display().to_string()))?;
        let relative = relative.to_string_lossy().replace('\\', "/");
        let file_name = entry.file_name().to_string_lossy().into_owned();

        let bytes = std::fs::read(entry.path())?;
        let digest = provider.digest(&bytes)?;
        let sig_digest = provider.digest(digest.as_bytes())?;
        let mime_type = mime_guess::from_path(entry.path())
            .first_raw()
            .unwrap_or(OCTET_STREAM);

        documents.push(AppliedDocument {
            url: relative.clone(),
            name: file_name.clone(),
            digest_value: digest.clone(),
            mime_type: mime_type.to_string(),
            code_document: CODE_DOCUMENT_PLACEHOLDER.to_string(),
            number,
        });
        documents.push(AppliedDocument {
            url: format!("{relative}.sig"),
            name: format!("{file_name}.sig"),
            digest_value: sig_digest,
            mime_type: SIG_MIME_TYPE.to_string(),
            code_document: CODE_DOCUMENT_PLACEHOLDER.to_string(),
            number: number + 1,
        });
        number += 2;

        archive
            .start_file(relative.clone(), options)
            .map_err(zip_error)?;
        archive.write_all(&bytes)?;
        archive
            .start_file(format!("{relative}.sig"), options)
            .map_err(zip_error)?;
        archive.write_all(digest.as_bytes())?;
    }
    debug!(files = documents.len() / 2, %request_code, "directory walked");

    let manifest = Manifest {
        request_code: request_code.clone(),
        documents,
    };
    let manifest_xml = manifest
        .to_xml()
        .to_pretty_xml()
        .map_err(|e| AttachmentError::ManifestFormat(e.to_string()))?;
    archive
        .start_file(format!("req_{request_code}.xml"), options)
        .map_err(zip_error)?;
    archive.write_all(manifest_xml.as_bytes())?;
    archive
        .start_file(format!("req_{request_code}.sig"), options)
        .map_err(zip_error)?;
    archive.write_all(provider.digest(manifest_xml.as_bytes())?.as_bytes())?;

    let cursor = archive.finish().map_err(zip_error)?;
    Ok(EncodedAttachments {
        request_code,
        payload: BASE64.encode(cursor.into_inner()),
    })
}

/// Extract a bundle into a directory, returning the parsed manifest and
/// the destination path.
pub fn extract_directory(
    request_code: &str,
    payload: &str,
    options: &ExtractOptions,
    provider: &dyn CryptoProvider,
) -> Result<(Manifest, PathBuf), AttachmentError> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| AttachmentError::Encoding(e.to_string()))?;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;

    let manifest_name = format!("req_{request_code}.xml");
    let manifest_xml = {
        let mut entry = archive
            .by_name(&manifest_name)
            .map_err(|_| AttachmentError::ManifestNotFound(manifest_name.clone()))?;
        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        text
    };
    let manifest = Manifest::parse(&manifest_xml, request_code)?;

    let destination = match &options.destination {
        Some(path) => {
            std::fs::create_dir_all(path)?;
            path.clone()
        }
        None => tempfile::tempdir()?.into_path(),
    };

    for document in &manifest.documents {
        if options.exclude_sigs && document.is_signature_entry() {
            continue;
        }
        let (bytes, entry_path) = {
            let mut entry = archive.by_name(&document.url).map_err(|_| {
                AttachmentError::Archive(format!(
                    "manifest names \"{}\" but the archive has no such entry",
                    document.url
                ))
            })?;
            let path = entry
                .enclosed_name()
                .ok_or_else(|| AttachmentError::UnsafeEntryPath(document.url.clone()))?;
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            (buf, path)
        };
        let target = destination.join(entry_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &bytes)?;

        if options.verify {
            let actual = provider.digest(&bytes)?;
            if actual != document.digest_value {
                return Err(AttachmentError::FileDigestMismatch {
                    path: document.url.clone(),
                    expected: document.digest_value.clone(),
                    actual,
                });
            }
        }
    }
    debug!(%request_code, destination = %destination.display(), "bundle extracted");

    Ok((manifest, destination))
}

fn zip_error(err: zip::result::ZipError) -> AttachmentError {
    AttachmentError::Archive(err.to_string())
}

fn walk_error(err: walkdir::Error) -> AttachmentError {
    match err.into_io_error() {
        Some(io) => AttachmentError::Io(io),
        None => AttachmentError::Archive("directory walk hit a filesystem loop".to_string()),
    }
}
