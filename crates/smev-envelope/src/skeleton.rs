//! Typed envelope skeleton: the message context and the SOAP envelope
//! builder, plus recovery of a context from a received envelope.
//!
//! The context replaces the original interchange dictionaries with typed
//! structs and enums: the field set, element order and defaults follow the
//! methodological recommendations (revision 2.5.6, with the 2.5.5
//! `ServiceName` shape supported for conversion targets).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use smev_core::document as xmldoc;
use smev_core::ns::{self, attr, node, wss};
use smev_core::xml::XmlElement;

use crate::error::EnvelopeError;

/// Supported revisions of the methodological recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmevVersion {
    V2_4_4,
    V2_5_5,
    V2_5_6,
}

impl SmevVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2_4_4 => "2.4.4",
            Self::V2_5_5 => "2.5.5",
            Self::V2_5_6 => "2.5.6",
        }
    }
}

impl std::fmt::Display for SmevVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message category by the interchange-node classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeCode {
    /// Provision of state services.
    Gsrv,
    /// Execution of state functions.
    Gfnc,
    /// Interaction for other purposes.
    Othr,
}

impl TypeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gsrv => "GSRV",
            Self::Gfnc => "GFNC",
            Self::Othr => "OTHR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "GSRV" => Some(Self::Gsrv),
            "GFNC" => Some(Self::Gfnc),
            "OTHR" => Some(Self::Othr),
            _ => None,
        }
    }
}

/// Electronic message status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Receipt acknowledgement.
    Accept,
    /// Application withdrawal.
    Cancel,
    /// Technical failure.
    Failure,
    /// Format-logical control error.
    Invalid,
    /// Error notification.
    Notify,
    /// Data/result poll.
    Ping,
    /// Batch exchange mode.
    Packet,
    /// In processing.
    Process,
    /// Motivated refusal.
    Reject,
    Request,
    Result,
    /// State return.
    State,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Cancel => "CANCEL",
            Self::Failure => "FAILURE",
            Self::Invalid => "INVALID",
            Self::Notify => "NOTIFY",
            Self::Ping => "PING",
            Self::Packet => "PACKET",
            Self::Process => "PROCESS",
            Self::Reject => "REJECT",
            Self::Request => "REQUEST",
            Self::Result => "RESULT",
            Self::State => "STATE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ACCEPT" => Some(Self::Accept),
            "CANCEL" => Some(Self::Cancel),
            "FAILURE" => Some(Self::Failure),
            "INVALID" => Some(Self::Invalid),
            "NOTIFY" => Some(Self::Notify),
            "PING" => Some(Self::Ping),
            "PACKET" => Some(Self::Packet),
            "PROCESS" => Some(Self::Process),
            "REJECT" => Some(Self::Reject),
            "REQUEST" => Some(Self::Request),
            "RESULT" => Some(Self::Result),
            "STATE" => Some(Self::State),
            _ => None,
        }
    }
}

/// An interacting information system: code and display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub code: String,
    pub name: String,
}

/// The invoked service, shaped per protocol version: 2.5.6 names a
/// mnemonic/version pair, 2.5.5 a bare service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceId {
    Service { mnemonic: String, version: String },
    ServiceName(String),
}

/// Attachment reference carried inside `MessageData`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDocument {
    pub request_code: String,
    pub binary_data: String,
}

/// Typed envelope header context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub sender: Agency,
    pub recipient: Agency,
    pub originator: Agency,
    pub service: ServiceId,
    pub type_code: TypeCode,
    pub status: Status,
    /// Message creation timestamp; defaulted to the current UTC instant
    /// when absent.
    pub date: Option<String>,
    /// Interaction category; defaulted to `"0"` (undetermined).
    pub exchange_type: Option<String>,
    pub test_msg: bool,
    pub case_number: Option<String>,
    pub app_document: Option<AppDocument>,
}

impl MessageContext {
    /// A blank REQUEST context for the given version, with the test-mode
    /// flag raised.
    pub fn blank(version: SmevVersion) -> Self {
        let service = match version {
            SmevVersion::V2_5_6 => ServiceId::Service {
                mnemonic: String::new(),
                version: String::new(),
            },
            _ => ServiceId::ServiceName(String::new()),
        };
        Self {
            sender: Agency::default(),
            recipient: Agency {
                code: String::new(),
                name: "Recipient".into(),
            },
            originator: Agency::default(),
            service,
            type_code: TypeCode::Gsrv,
            status: Status::Request,
            date: None,
            exchange_type: None,
            test_msg: true,
            case_number: None,
            app_document: None,
        }
    }
}

/// Build an envelope with an empty `AppData` block.
pub fn construct_envelope(
    action_name: &str,
    ctx: &MessageContext,
    version: SmevVersion,
) -> Result<XmlElement, EnvelopeError> {
    construct_envelope_with_app_data(action_name, ctx, version, None)
}

/// Build a SOAP envelope around the context: `Envelope(Header, Body
/// wsu:Id="body" → inf:<action>(Message, MessageData))`, with the full
/// namespace table declared on the root the way the wire format expects.
pub fn construct_envelope_with_app_data(
    action_name: &str,
    ctx: &MessageContext,
    version: SmevVersion,
    app_data: Option<XmlElement>,
) -> Result<XmlElement, EnvelopeError> {
    let service_node = match (&ctx.service, version) {
        (ServiceId::Service { mnemonic, version }, SmevVersion::V2_5_6) => {
            XmlElement::ns("smev", node::SERVICE)
                .child(XmlElement::ns("smev", node::MNEMONIC).text(mnemonic.clone()))
                .child(XmlElement::ns("smev", node::VERSION).text(version.clone()))
        }
        (ServiceId::ServiceName(name), SmevVersion::V2_5_5 | SmevVersion::V2_4_4) => {
            XmlElement::ns("smev", node::SERVICE_NAME).text(name.clone())
        }
        _ => return Err(EnvelopeError::ServiceMismatch(version)),
    };

    let mut message = XmlElement::ns("smev", node::MESSAGE)
        .child(agency_node(node::SENDER, &ctx.sender))
        .child(agency_node(node::RECIPIENT, &ctx.recipient))
        .child(agency_node(node::ORIGINATOR, &ctx.originator))
        .child(service_node)
        .child(XmlElement::ns("smev", node::TYPE_CODE).text(ctx.type_code.as_str()))
        .child(XmlElement::ns("smev", node::STATUS).text(ctx.status.as_str()))
        .child(
            XmlElement::ns("smev", node::DATE)
                .text(ctx.date.clone().unwrap_or_else(default_timestamp)),
        )
        .child(
            XmlElement::ns("smev", node::EXCHANGE_TYPE)
                .text(ctx.exchange_type.clone().unwrap_or_else(|| "0".into())),
        );
    if ctx.test_msg {
        message.push_child(XmlElement::ns("smev", node::TEST_MSG).text("true"));
    }
    if let Some(case_number) = &ctx.case_number {
        message.push_child(XmlElement::ns("smev", node::CASE_NUMBER).text(case_number.clone()));
    }

    let mut app_data_node =
        XmlElement::ns("smev", node::APP_DATA).ns_attr("wsu", attr::ID, "AppData");
    if let Some(payload) = app_data {
        app_data_node.push_child(payload);
    }

    let (request_code, binary_data) = ctx
        .app_document
        .as_ref()
        .map(|d| (d.request_code.as_str(), d.binary_data.as_str()))
        .unwrap_or(("", ""));
    let app_document_node = XmlElement::ns("smev", node::APP_DOCUMENT)
        .child(optional_text(
            XmlElement::ns("smev", node::REQUEST_CODE),
            request_code,
        ))
        .child(optional_text(
            XmlElement::ns("smev", node::BINARY_DATA),
            binary_data,
        ));

    let message_data = XmlElement::ns("smev", node::MESSAGE_DATA)
        .child(app_data_node)
        .child(app_document_node);

    let action = XmlElement::ns("inf", action_name)
        .child(message)
        .child(message_data);

    let body = XmlElement::ns("SOAP-ENV", node::BODY)
        .ns_attr("wsu", attr::ID, wss::BODY_ID)
        .child(action);

    let mut envelope = XmlElement::ns("SOAP-ENV", node::ENVELOPE);
    for (prefix, uri) in ns::NS_TABLE {
        envelope = envelope.declare_ns(*prefix, *uri);
    }
    Ok(envelope
        .child(XmlElement::ns("SOAP-ENV", node::HEADER))
        .child(body))
}

/// Recover a typed context from a received 2.5.6 envelope.
pub fn extract_context(xml: &str) -> Result<MessageContext, EnvelopeError> {
    let doc =
        roxmltree::Document::parse(xml).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
    let message = xmldoc::find_element(&doc, ns::SMEV, node::MESSAGE)
        .ok_or(EnvelopeError::MissingElement(node::MESSAGE))?;

    let block_text = |block: &str, leaf: &str| -> String {
        xmldoc::find_child(message, ns::SMEV, block)
            .and_then(|b| xmldoc::find_child(b, ns::SMEV, leaf))
            .map(xmldoc::element_text)
            .unwrap_or_default()
            .to_string()
    };
    let direct_text = |name: &str| -> String {
        xmldoc::find_child(message, ns::SMEV, name)
            .map(xmldoc::element_text)
            .unwrap_or_default()
            .to_string()
    };
    let agency = |block: &str| Agency {
        code: block_text(block, node::CODE),
        name: block_text(block, node::NAME),
    };

    let service = match xmldoc::find_child(message, ns::SMEV, node::SERVICE) {
        Some(_) => ServiceId::Service {
            mnemonic: block_text(node::SERVICE, node::MNEMONIC),
            version: block_text(node::SERVICE, node::VERSION),
        },
        None => ServiceId::ServiceName(direct_text(node::SERVICE_NAME)),
    };

    let type_code_text = direct_text(node::TYPE_CODE);
    let type_code = TypeCode::from_code(&type_code_text)
        .ok_or_else(|| EnvelopeError::Malformed(format!("unknown type code \"{type_code_text}\"")))?;
    let status_text = direct_text(node::STATUS);
    let status = Status::from_code(&status_text)
        .ok_or_else(|| EnvelopeError::Malformed(format!("unknown status \"{status_text}\"")))?;

    let optional = |name: &str| -> Option<String> {
        let text = direct_text(name);
        (!text.is_empty()).then_some(text)
    };

    let app_document = xmldoc::find_element(&doc, ns::SMEV, node::APP_DOCUMENT).and_then(|n| {
        let request_code = xmldoc::find_child(n, ns::SMEV, node::REQUEST_CODE)
            .map(xmldoc::element_text)
            .unwrap_or_default()
            .to_string();
        let binary_data = xmldoc::find_child(n, ns::SMEV, node::BINARY_DATA)
            .map(xmldoc::element_text)
            .unwrap_or_default()
            .to_string();
        (!request_code.is_empty() || !binary_data.is_empty()).then_some(AppDocument {
            request_code,
            binary_data,
        })
    });

    Ok(MessageContext {
        sender: agency(node::SENDER),
        recipient: agency(node::RECIPIENT),
        originator: agency(node::ORIGINATOR),
        service,
        type_code,
        status,
        date: optional(node::DATE),
        exchange_type: optional(node::EXCHANGE_TYPE),
        test_msg: direct_text(node::TEST_MSG) == "true",
        case_number: optional(node::CASE_NUMBER),
        app_document,
    })
}

fn agency_node(name: &str, agency: &Agency) -> XmlElement {
    XmlElement::ns("smev", name)
        .child(XmlElement::ns("smev", node::CODE).text(agency.code.clone()))
        .child(XmlElement::ns("smev", node::NAME).text(agency.name.clone()))
}

fn optional_text(element: XmlElement, value: &str) -> XmlElement {
    if value.is_empty() {
        element
    } else {
        element.text(value)
    }
}

/// UTC creation timestamp, `yyyy-MM-ddTHH:mm:ss.SSSS`.
fn default_timestamp() -> String {
    let formatted = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
    formatted[..formatted.len() - 2].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smev_core::document::{find_child, find_element};

    fn full_context() -> MessageContext {
        MessageContext {
            sender: Agency {
                code: "SEND01001".into(),
                name: "Sender".into(),
            },
            recipient: Agency {
                code: "RECV01001".into(),
                name: "Recipient".into(),
            },
            originator: Agency {
                code: "SEND01001".into(),
                name: "Sender's origin".into(),
            },
            service: ServiceId::Service {
                mnemonic: "MONR001001".into(),
                version: "0.10".into(),
            },
            type_code: TypeCode::Gsrv,
            status: Status::Request,
            date: Some("2014-02-23T11:54:38.8091".into()),
            exchange_type: None,
            test_msg: true,
            case_number: None,
            app_document: None,
        }
    }

    #[test]
    fn test_envelope_creation_places_context_values() {
        let ctx = full_context();
        let xml = construct_envelope("TestPacket", &ctx, SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();

        let message = find_element(&doc, ns::SMEV, node::MESSAGE).unwrap();
        let block = |name: &str, leaf: &str| {
            find_child(message, ns::SMEV, name)
                .and_then(|b| find_child(b, ns::SMEV, leaf))
                .and_then(|n| n.text())
                .unwrap_or("")
                .to_string()
        };
        assert_eq!(block(node::SENDER, node::CODE), "SEND01001");
        assert_eq!(block(node::SENDER, node::NAME), "Sender");
        assert_eq!(block(node::RECIPIENT, node::CODE), "RECV01001");
        assert_eq!(block(node::ORIGINATOR, node::NAME), "Sender's origin");
        assert_eq!(block(node::SERVICE, node::MNEMONIC), "MONR001001");
        assert_eq!(block(node::SERVICE, node::VERSION), "0.10");

        let direct = |name: &str| {
            find_child(message, ns::SMEV, name)
                .and_then(|n| n.text())
                .unwrap_or("")
                .to_string()
        };
        assert_eq!(direct(node::TYPE_CODE), "GSRV");
        assert_eq!(direct(node::STATUS), "REQUEST");
        assert_eq!(direct(node::TEST_MSG), "true");
        assert_eq!(direct(node::EXCHANGE_TYPE), "0");
        assert_eq!(direct(node::DATE), "2014-02-23T11:54:38.8091");
    }

    #[test]
    fn test_body_carries_anchor_id() {
        let xml = construct_envelope("TestPacket", &full_context(), SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let body = find_element(&doc, ns::SOAP_ENV, node::BODY).unwrap();
        assert_eq!(body.attribute((ns::WSU, attr::ID)), Some("body"));
    }

    #[test]
    fn test_action_wraps_message_and_message_data() {
        let xml = construct_envelope("TestPacket", &full_context(), SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let action = find_element(&doc, ns::INF, "TestPacket").unwrap();
        assert!(find_child(action, ns::SMEV, node::MESSAGE).is_some());
        assert!(find_child(action, ns::SMEV, node::MESSAGE_DATA).is_some());
    }

    #[test]
    fn test_service_shape_must_match_version() {
        let ctx = full_context();
        assert!(matches!(
            construct_envelope("TestPacket", &ctx, SmevVersion::V2_5_5),
            Err(EnvelopeError::ServiceMismatch(SmevVersion::V2_5_5))
        ));

        let mut named = ctx;
        named.service = ServiceId::ServiceName("MONR".into());
        assert!(construct_envelope("TestPacket", &named, SmevVersion::V2_5_5).is_ok());
        assert!(matches!(
            construct_envelope("TestPacket", &named, SmevVersion::V2_5_6),
            Err(EnvelopeError::ServiceMismatch(SmevVersion::V2_5_6))
        ));
    }

    #[test]
    fn test_app_document_embedded() {
        let mut ctx = full_context();
        ctx.app_document = Some(AppDocument {
            request_code: "req-123".into(),
            binary_data: "AAECAw==".into(),
        });
        let xml = construct_envelope("TestPacket", &ctx, SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        assert!(xml.contains("<smev:RequestCode>req-123</smev:RequestCode>"));
        assert!(xml.contains("<smev:BinaryData>AAECAw==</smev:BinaryData>"));
    }

    #[test]
    fn test_empty_app_document_renders_empty_slots() {
        let xml = construct_envelope("TestPacket", &full_context(), SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        assert!(xml.contains("<smev:RequestCode/>"));
        assert!(xml.contains("<smev:BinaryData/>"));
    }

    #[test]
    fn test_test_msg_flag_omitted_when_lowered() {
        let mut ctx = full_context();
        ctx.test_msg = false;
        let xml = construct_envelope("TestPacket", &ctx, SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        assert!(!xml.contains("TestMsg"));
    }

    #[test]
    fn test_case_number_appended() {
        let mut ctx = full_context();
        ctx.case_number = Some("DELO-42".into());
        let xml = construct_envelope("TestPacket", &ctx, SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        assert!(xml.contains("<smev:CaseNumber>DELO-42</smev:CaseNumber>"));
    }

    #[test]
    fn test_extract_context_round_trip() {
        let ctx = full_context();
        let xml = construct_envelope("TestPacket", &ctx, SmevVersion::V2_5_6)
            .unwrap()
            .to_xml_string()
            .unwrap();
        let recovered = extract_context(&xml).unwrap();
        // The builder materializes the default exchange type; everything
        // else survives unchanged.
        let mut expected = ctx;
        expected.exchange_type = Some("0".into());
        assert_eq!(recovered, expected);
    }

    #[test]
    fn test_extract_context_requires_message() {
        let xml = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"><SOAP-ENV:Body/></SOAP-ENV:Envelope>"#;
        assert!(matches!(
            extract_context(xml),
            Err(EnvelopeError::MissingElement("Message"))
        ));
    }

    #[test]
    fn test_blank_context_shapes_service_by_version() {
        assert!(matches!(
            MessageContext::blank(SmevVersion::V2_5_6).service,
            ServiceId::Service { .. }
        ));
        assert!(matches!(
            MessageContext::blank(SmevVersion::V2_5_5).service,
            ServiceId::ServiceName(_)
        ));
    }

    #[test]
    fn test_default_timestamp_shape() {
        let ts = default_timestamp();
        // yyyy-MM-ddTHH:mm:ss.SSSS
        assert_eq!(ts.len(), 24);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }
}
