//! Error replies: a REJECT (or custom-status) envelope answering a
//! received request, with the error code and message attached under
//! `AppData`.

use smev_core::xml::XmlElement;

use crate::error::EnvelopeError;
use crate::skeleton::{construct_envelope_with_app_data, extract_context, SmevVersion, Status};

/// Build an error reply to a received request: sender and recipient are
/// swapped, the status set (REJECT unless overridden), and an
/// `inf:Error{errorCode, errorMessage}` block placed into `AppData`.
pub fn construct_error_reply(
    request_xml: &str,
    error_code: &str,
    error_message: &str,
    status: Option<Status>,
) -> Result<String, EnvelopeError> {
    let mut ctx = extract_context(request_xml)?;
    std::mem::swap(&mut ctx.sender, &mut ctx.recipient);
    ctx.status = status.unwrap_or(Status::Reject);

    let error_node = XmlElement::ns("inf", "Error")
        .child(XmlElement::inherited("errorCode").text(error_code))
        .child(XmlElement::inherited("errorMessage").text(error_message));

    let envelope = construct_envelope_with_app_data(
        "Error",
        &ctx,
        SmevVersion::V2_5_6,
        Some(error_node),
    )?;
    Ok(envelope.to_xml_string()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{construct_envelope, Agency, MessageContext, ServiceId};

    fn request() -> String {
        let mut ctx = MessageContext::blank(SmevVersion::V2_5_6);
        ctx.sender = Agency {
            code: "AAAA11112".into(),
            name: "Sender".into(),
        };
        ctx.recipient = Agency {
            code: "BBBB22222".into(),
            name: "Recipient".into(),
        };
        ctx.service = ServiceId::Service {
            mnemonic: "TEST001001".into(),
            version: "0.10".into(),
        };
        construct_envelope("TestRequest", &ctx, SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap()
    }

    #[test]
    fn test_reply_swaps_sender_and_recipient() {
        let reply = construct_error_reply(&request(), "500", "boom", None).unwrap();
        let ctx = extract_context(&reply).unwrap();
        assert_eq!(ctx.sender.code, "BBBB22222");
        assert_eq!(ctx.recipient.code, "AAAA11112");
    }

    #[test]
    fn test_reply_defaults_to_reject() {
        let reply = construct_error_reply(&request(), "500", "boom", None).unwrap();
        assert!(reply.contains("<smev:Status>REJECT</smev:Status>"));
    }

    #[test]
    fn test_reply_status_override() {
        let reply =
            construct_error_reply(&request(), "500", "boom", Some(Status::Invalid)).unwrap();
        assert!(reply.contains("<smev:Status>INVALID</smev:Status>"));
    }

    #[test]
    fn test_error_block_lives_under_app_data() {
        let reply = construct_error_reply(&request(), "42", "details here", None).unwrap();
        assert!(reply.contains("<inf:Error>"));
        assert!(reply.contains("<inf:errorCode>42</inf:errorCode>"));
        assert!(reply.contains("<inf:errorMessage>details here</inf:errorMessage>"));
        let app_data = reply.find("<smev:AppData").unwrap();
        let error = reply.find("<inf:Error>").unwrap();
        let app_data_close = reply.find("</smev:AppData>").unwrap();
        assert!(app_data < error && error < app_data_close);
    }

    #[test]
    fn test_reply_wraps_error_action() {
        let reply = construct_error_reply(&request(), "1", "m", None).unwrap();
        assert!(reply.contains("<inf:Error xmlns") || reply.contains("<inf:Error>"));
        assert!(reply.contains("inf:Error"));
        // The action element is inf:Error as well.
        let doc = roxmltree::Document::parse(&reply).unwrap();
        let actions: Vec<_> = doc
            .descendants()
            .filter(|n| {
                n.is_element()
                    && n.tag_name().name() == "Error"
                    && n.tag_name().namespace() == Some(smev_core::ns::INF)
            })
            .collect();
        assert_eq!(actions.len(), 2);
    }
}
