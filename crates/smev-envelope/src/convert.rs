//! Inter-version envelope conversion.
//!
//! Conversions are registered per `(from, to)` pair; the only shipped path
//! reshapes a 2.5.6 message for a 2.5.5 consumer by collapsing the
//! `Service{Mnemonic, Version}` block into a bare `ServiceName` at the same
//! position. Anything else fails with `UnsupportedConversion`.
//!
//! The conversion is an immutable transform: the input is parsed into an
//! owned tree, reshaped, and re-serialized — the caller's document is
//! never touched.

use smev_core::ns::node;
use smev_core::xml::XmlElement;
use tracing::debug;

use crate::error::EnvelopeError;
use crate::skeleton::SmevVersion;

/// Convert an envelope between protocol versions.
pub fn convert_envelope(
    xml: &str,
    from: SmevVersion,
    to: SmevVersion,
) -> Result<String, EnvelopeError> {
    match (from, to) {
        (SmevVersion::V2_5_6, SmevVersion::V2_5_5) => convert_256_to_255(xml),
        _ => Err(EnvelopeError::UnsupportedConversion { from, to }),
    }
}

fn convert_256_to_255(xml: &str) -> Result<String, EnvelopeError> {
    let mut envelope = XmlElement::parse(xml)?;
    let message = envelope
        .find_descendant_mut(node::MESSAGE)
        .ok_or(EnvelopeError::MissingElement(node::MESSAGE))?;

    let mnemonic = message
        .find_descendant(node::SERVICE)
        .and_then(|s| s.find_descendant(node::MNEMONIC))
        .and_then(|m| m.text_content())
        .ok_or(EnvelopeError::MissingElement(node::SERVICE))?
        .to_string();

    let children = message
        .child_elements_mut()
        .ok_or_else(|| EnvelopeError::Malformed("Message element holds no children".into()))?;
    let position = children
        .iter()
        .position(|c| c.name() == node::SERVICE)
        .ok_or(EnvelopeError::MissingElement(node::SERVICE))?;
    children[position] = XmlElement::ns("smev", node::SERVICE_NAME).text(mnemonic);
    debug!("converted Service block to ServiceName");

    Ok(envelope.to_xml_string()?)
}
