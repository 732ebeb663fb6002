//! Signature verification over a received signed document.
//!
//! Processing order:
//!
//! 1. canonicalize the body and compare its digest with the recorded
//!    `DigestValue` — a mismatch returns `Ok(false)` without touching the
//!    signature engine;
//! 2. reconstitute the certificate from the `BinarySecurityToken` payload;
//! 3. canonicalize `SignedInfo` and ask the provider to verify the
//!    recorded `SignatureValue` against the certificate's public key.
//!
//! Structural faults surface as [`VerifyError::MissingElement`]; engine
//! faults as [`VerifyError::Provider`]. Neither is ever folded into a
//! boolean — callers can always distinguish "could not verify" from
//! "verified false".

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use smev_core::canonical::CanonicalXml;
use smev_core::document as xmldoc;
use smev_core::ns::{self, attr, node, wss};
use smev_crypto::{CryptoProvider, CryptoProviderError};
use tracing::debug;

use crate::error::{MissingElement, VerifyError};

/// Verify the signature header of a signed document.
pub fn verify_envelope(xml: &str, provider: &dyn CryptoProvider) -> Result<bool, VerifyError> {
    let doc =
        roxmltree::Document::parse(xml).map_err(|e| VerifyError::Malformed(e.to_string()))?;

    let body = locate_body(&doc).ok_or(VerifyError::MissingElement(MissingElement::Body))?;
    let security = xmldoc::find_element(&doc, ns::WSSE, node::SECURITY);

    let digest_node = security
        .and_then(|s| xmldoc::find_descendant(s, ns::DSIG, node::DIGEST_VALUE))
        .ok_or(VerifyError::MissingElement(MissingElement::DigestValue))?;
    let recorded_digest = xmldoc::element_text(digest_node);

    let canonical_body = CanonicalXml::of_node(body)?;
    let computed_digest = provider.digest(canonical_body.as_bytes())?;
    if computed_digest != recorded_digest {
        debug!("body digest mismatch, rejecting without signature check");
        return Ok(false);
    }

    let token_node = security
        .and_then(|s| xmldoc::find_descendant(s, ns::WSSE, node::BINARY_SECURITY_TOKEN))
        .ok_or(VerifyError::MissingElement(MissingElement::BinarySecurityToken))?;
    let token_text: String = xmldoc::element_text(token_node)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let certificate = BASE64.decode(token_text.as_bytes()).map_err(|e| {
        VerifyError::Provider(CryptoProviderError::InvalidKeyMaterial(format!(
            "binary security token is not valid base64: {e}"
        )))
    })?;

    let signed_info = security
        .and_then(|s| xmldoc::find_descendant(s, ns::DSIG, node::SIGNED_INFO))
        .ok_or(VerifyError::MissingElement(MissingElement::SignedInfo))?;
    let signature_node = security
        .and_then(|s| xmldoc::find_descendant(s, ns::DSIG, node::SIGNATURE_VALUE))
        .ok_or(VerifyError::MissingElement(MissingElement::SignatureValue))?;

    let canonical_signed_info = CanonicalXml::of_node(signed_info)?;
    let valid = provider.verify(
        canonical_signed_info.as_bytes(),
        &certificate,
        xmldoc::element_text(signature_node),
    )?;
    Ok(valid)
}

/// The signed body: the element anchored by `wsu:Id="body"`, falling back
/// to the SOAP `Body` element for envelopes produced by stacks that anchor
/// the reference only by position.
pub(crate) fn locate_body<'a>(
    doc: &'a roxmltree::Document<'a>,
) -> Option<roxmltree::Node<'a, 'a>> {
    xmldoc::find_by_attribute(doc, ns::WSU, attr::ID, wss::BODY_ID)
        .or_else(|| xmldoc::find_element(doc, ns::SOAP_ENV, node::BODY))
}
