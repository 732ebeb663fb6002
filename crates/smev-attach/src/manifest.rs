//! The `AppliedDocuments` manifest: one record per archive entry, produced
//! in file/signature-file pairs with a globally monotonic ordering number.

use serde::{Deserialize, Serialize};
use smev_core::xml::XmlElement;

use crate::error::AttachmentError;

/// Document classification code placeholder used until the classifier
/// rules are published.
pub const CODE_DOCUMENT_PLACEHOLDER: &str = "0000";

/// MIME type recorded for derived `.sig` entries.
pub const SIG_MIME_TYPE: &str = "application/x-pkcs7-signature";

/// Fallback MIME type for files without a recognized extension.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One manifest record.
///
/// Records come in pairs: the entry for a raw file carries
/// `digest(content)`, and the synthetic entry for its `.sig` counterpart
/// carries `digest(digest(content))` — the digest of the first entry's
/// digest text, not of any file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDocument {
    /// Archive-relative path of the entry.
    #[serde(rename = "URL")]
    pub url: String,
    /// Bare file name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Base64 digest text.
    #[serde(rename = "DigestValue")]
    pub digest_value: String,
    /// MIME type by extension, `application/octet-stream` when unknown.
    #[serde(rename = "Type")]
    pub mime_type: String,
    /// Document classification code.
    #[serde(rename = "CodeDocument")]
    pub code_document: String,
    /// Ordering number: starts at 1, +2 per file/signature pair.
    #[serde(rename = "Number")]
    pub number: u32,
}

impl AppliedDocument {
    pub(crate) fn to_xml(&self) -> XmlElement {
        XmlElement::new("AppliedDocument")
            .child(XmlElement::new("URL").text(self.url.clone()))
            .child(XmlElement::new("Name").text(self.name.clone()))
            .child(XmlElement::new("DigestValue").text(self.digest_value.clone()))
            .child(XmlElement::new("Type").text(self.mime_type.clone()))
            .child(XmlElement::new("CodeDocument").text(self.code_document.clone()))
            .child(XmlElement::new("Number").text(self.number.to_string()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Result<Self, AttachmentError> {
        let text = |name: &str| -> Option<String> {
            node.children()
                .find(|c| c.is_element() && c.tag_name().name() == name)
                .map(|c| c.text().unwrap_or("").trim().to_string())
        };
        let required = |name: &'static str| -> Result<String, AttachmentError> {
            text(name).ok_or_else(|| {
                AttachmentError::ManifestFormat(format!("AppliedDocument without {name}"))
            })
        };
        Ok(Self {
            url: required("URL")?,
            name: required("Name")?,
            digest_value: required("DigestValue")?,
            mime_type: text("Type").unwrap_or_else(|| OCTET_STREAM.to_string()),
            code_document: text("CodeDocument")
                .unwrap_or_else(|| CODE_DOCUMENT_PLACEHOLDER.to_string()),
            // Lenient read: writers are strict about numbering, readers
            // tolerate foreign manifests that are not.
            number: text("Number")
                .and_then(|n| n.parse().ok())
                .unwrap_or_default(),
        })
    }

    /// Whether this record describes a derived signature-file entry.
    pub fn is_signature_entry(&self) -> bool {
        self.name.ends_with(".sig")
    }
}

/// The parsed manifest of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Request code naming the manifest inside the archive.
    pub request_code: String,
    /// Records in traversal order.
    pub documents: Vec<AppliedDocument>,
}

impl Manifest {
    /// Render the `AppliedDocuments` tree.
    pub fn to_xml(&self) -> XmlElement {
        XmlElement::new("AppliedDocuments")
            .children(self.documents.iter().map(AppliedDocument::to_xml))
    }

    /// Parse manifest XML extracted from an archive.
    pub fn parse(xml: &str, request_code: &str) -> Result<Self, AttachmentError> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| AttachmentError::ManifestFormat(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "AppliedDocuments" {
            return Err(AttachmentError::ManifestFormat(format!(
                "unexpected manifest root \"{}\"",
                root.tag_name().name()
            )));
        }
        let mut documents = Vec::new();
        for child in root.children() {
            if child.is_element() && child.tag_name().name() == "AppliedDocument" {
                documents.push(AppliedDocument::from_node(child)?);
            }
        }
        Ok(Self {
            request_code: request_code.to_string(),
            documents,
        })
    }

    /// Record for an archive-relative path.
    pub fn document_for(&self, url: &str) -> Option<&AppliedDocument> {
        self.documents.iter().find(|d| d.url == url)
    }
}
