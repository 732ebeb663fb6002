//! WS-Security signature header construction and the signing transform.
//!
//! Signing walks the state machine `Unsigned → HeaderAttached →
//! DigestComputed → Signed` over an owned copy of the envelope:
//!
//! 1. if a security header already exists the document is already signed
//!    and is returned untouched;
//! 2. otherwise the header skeleton is attached with the certificate
//!    payload and the fixed algorithm identifiers;
//! 3. the body subtree is canonicalized and digested, and the digest text
//!    written into `DigestValue`;
//! 4. the `SignedInfo` subtree — which now covers the digest and the
//!    algorithm identifiers but not the still-empty `SignatureValue` — is
//!    canonicalized and signed, and the signature text written into
//!    `SignatureValue`.
//!
//! The digest always exists before the signature covering it is computed.

use smev_core::canonical::CanonicalXml;
use smev_core::document as xmldoc;
use smev_core::ns::{self, algorithm, attr, node, wss};
use smev_core::xml::XmlElement;
use smev_crypto::{CryptoProvider, KeyMaterial};
use tracing::debug;

use crate::document::SignedDocument;
use crate::error::EnvelopeError;
use crate::verify::locate_body;

/// Sign an envelope, producing a new [`SignedDocument`].
///
/// The input is not mutated. If a `wsse:Security` header is already
/// present the input is considered signed and returned as-is — this
/// subsystem never re-signs a document.
pub fn sign_envelope(
    envelope_xml: &str,
    provider: &dyn CryptoProvider,
    key: &KeyMaterial,
) -> Result<SignedDocument, EnvelopeError> {
    let parsed = roxmltree::Document::parse(envelope_xml)
        .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
    if xmldoc::find_element(&parsed, ns::WSSE, node::SECURITY).is_some() {
        debug!("security header already present, skipping signing");
        return Ok(SignedDocument::new(envelope_xml.to_string()));
    }
    let mut envelope = XmlElement::from_document(&parsed)?;
    drop(parsed);

    // Unsigned → HeaderAttached
    let certificate = key.certificate_payload()?;
    envelope
        .child_named_mut(node::HEADER)
        .ok_or(EnvelopeError::MissingElement(node::HEADER))?
        .push_child(security_header(&certificate));

    // HeaderAttached → DigestComputed
    let rendered = envelope.to_xml_string()?;
    let digest_value = {
        let doc = roxmltree::Document::parse(&rendered)
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        let body = locate_body(&doc).ok_or(EnvelopeError::MissingElement(node::BODY))?;
        let canonical = CanonicalXml::of_node(body)?;
        provider.digest(canonical.as_bytes())?
    };
    set_header_value(&mut envelope, node::DIGEST_VALUE, &digest_value)?;
    debug!(digest = %digest_value, "body digest computed");

    // DigestComputed → Signed
    let rendered = envelope.to_xml_string()?;
    let signature_value = {
        let doc = roxmltree::Document::parse(&rendered)
            .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        let security = xmldoc::find_element(&doc, ns::WSSE, node::SECURITY)
            .ok_or(EnvelopeError::MissingElement(node::SECURITY))?;
        let signed_info = xmldoc::find_descendant(security, ns::DSIG, node::SIGNED_INFO)
            .ok_or(EnvelopeError::MissingElement(node::SIGNED_INFO))?;
        let canonical = CanonicalXml::of_node(signed_info)?;
        provider.sign(canonical.as_bytes(), key)?
    };
    set_header_value(&mut envelope, node::SIGNATURE_VALUE, &signature_value)?;

    Ok(SignedDocument::new(envelope.to_xml_string()?))
}

/// The WS-Security header skeleton with the fixed algorithm identifiers
/// and an empty digest/signature pair.
pub(crate) fn security_header(certificate: &str) -> XmlElement {
    let token = XmlElement::ns("wsse", node::BINARY_SECURITY_TOKEN)
        .attr(attr::ENCODING_TYPE, wss::ENCODING_BASE64)
        .attr(attr::VALUE_TYPE, wss::VALUE_X509)
        .ns_attr("wsu", attr::ID, wss::CERT_ID)
        .text(certificate);

    let transforms = XmlElement::ns("ds", node::TRANSFORMS)
        .child(XmlElement::ns("ds", node::TRANSFORM).attr(attr::ALGORITHM, algorithm::ENVELOPED_SIGNATURE))
        .child(XmlElement::ns("ds", node::TRANSFORM).attr(attr::ALGORITHM, algorithm::EXC_C14N));

    let reference = XmlElement::ns("ds", node::REFERENCE)
        .attr(attr::URI, wss::BODY_REF)
        .child(transforms)
        .child(XmlElement::ns("ds", node::DIGEST_METHOD).attr(attr::ALGORITHM, algorithm::GOST_DIGEST))
        .child(XmlElement::ns("ds", node::DIGEST_VALUE));

    let signed_info = XmlElement::ns("ds", node::SIGNED_INFO)
        .child(
            XmlElement::ns("ds", node::CANONICALIZATION_METHOD)
                .attr(attr::ALGORITHM, algorithm::EXC_C14N),
        )
        .child(
            XmlElement::ns("ds", node::SIGNATURE_METHOD)
                .attr(attr::ALGORITHM, algorithm::GOST_SIGNATURE),
        )
        .child(reference);

    let key_info = XmlElement::ns("ds", node::KEY_INFO).child(
        XmlElement::ns("wsse", node::SECURITY_TOKEN_REFERENCE).child(
            XmlElement::ns("wsse", node::REFERENCE)
                .attr(attr::URI, wss::CERT_REF)
                .attr(attr::VALUE_TYPE, wss::VALUE_X509),
        ),
    );

    let signature = XmlElement::ns("ds", node::SIGNATURE)
        .child(signed_info)
        .child(XmlElement::ns("ds", node::SIGNATURE_VALUE))
        .child(key_info);

    XmlElement::ns("wsse", node::SECURITY)
        .ns_attr("SOAP-ENV", attr::ACTOR, wss::ACTOR)
        .child(token)
        .child(signature)
}

fn set_header_value(
    envelope: &mut XmlElement,
    name: &str,
    value: &str,
) -> Result<(), EnvelopeError> {
    envelope
        .child_named_mut(node::HEADER)
        .and_then(|h| h.find_descendant_mut(name))
        .ok_or(EnvelopeError::MissingElement(node::SECURITY))?
        .set_text(value);
    Ok(())
}
