//! Protocol constant tables: namespace URIs, element and attribute names,
//! and the algorithm identifiers mandated by the methodological
//! recommendations. These values appear verbatim on the wire and must not
//! be altered.

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// XML Digital Signature namespace.
pub const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

/// WS-Security extensions namespace.
pub const WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// WS-Security utility namespace (carries the `Id` anchor attributes).
pub const WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// SMEV message namespace, revision 120315.
pub const SMEV: &str = "http://smev.gosuslugi.ru/rev120315";

/// Agency-specific payload namespace.
pub const INF: &str = "http://smev.gosuslugi.ru/inf/";

/// Regional web-service namespace.
pub const WS: &str = "http://pe.minregion.ru/";

/// The XML namespace itself (bound to the reserved `xml` prefix).
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix → namespace URI table used when serializing constructed
/// documents. Mirrors the envelope-root `nsmap` of the wire format.
pub const NS_TABLE: &[(&str, &str)] = &[
    ("SOAP-ENV", SOAP_ENV),
    ("ds", DSIG),
    ("inf", INF),
    ("smev", SMEV),
    ("ws", WS),
    ("wsse", WSSE),
    ("wsu", WSU),
];

/// Look up the namespace URI bound to a well-known prefix.
pub fn uri_for_prefix(prefix: &str) -> Option<&'static str> {
    NS_TABLE
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

/// Look up the well-known prefix bound to a namespace URI.
pub fn prefix_for_uri(uri: &str) -> Option<&'static str> {
    NS_TABLE.iter().find(|(_, u)| *u == uri).map(|(p, _)| *p)
}

/// Fixed algorithm identifier URIs. These are attribute values inside the
/// signature header and must match the external verifier byte for byte.
pub mod algorithm {
    /// Exclusive canonicalization without comments.
    pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";

    /// Enveloped-signature transform.
    pub const ENVELOPED_SIGNATURE: &str =
        "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

    /// GOST R 34.11-94 digest method.
    pub const GOST_DIGEST: &str = "http://www.w3.org/2001/04/xmldsig-more#gostr3411";

    /// GOST R 34.10-2001 / GOST R 34.11-94 signature method.
    pub const GOST_SIGNATURE: &str =
        "http://www.w3.org/2001/04/xmldsig-more#gostr34102001-gostr3411";
}

/// WS-Security header constants.
pub mod wss {
    /// Designated actor of the interchange node.
    pub const ACTOR: &str = "http://smev.gosuslugi.ru/actors/smev";

    /// BinarySecurityToken encoding type.
    pub const ENCODING_BASE64: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

    /// BinarySecurityToken / token reference value type.
    pub const VALUE_X509: &str =
        "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-x509-token-profile-1.0#X509v3";

    /// Local identifier of the certificate token.
    pub const CERT_ID: &str = "CertId";

    /// Same-document reference to the certificate token.
    pub const CERT_REF: &str = "#CertId";

    /// Same-document reference to the signed body.
    pub const BODY_REF: &str = "#body";

    /// Value of the `wsu:Id` anchor on the body element.
    pub const BODY_ID: &str = "body";
}

/// Element local names.
pub mod node {
    // SOAP elements
    pub const ENVELOPE: &str = "Envelope";
    pub const HEADER: &str = "Header";
    pub const BODY: &str = "Body";

    // WS-Security elements
    pub const SECURITY: &str = "Security";
    pub const BINARY_SECURITY_TOKEN: &str = "BinarySecurityToken";
    pub const SECURITY_TOKEN_REFERENCE: &str = "SecurityTokenReference";

    // DSig elements
    pub const SIGNATURE: &str = "Signature";
    pub const SIGNED_INFO: &str = "SignedInfo";
    pub const CANONICALIZATION_METHOD: &str = "CanonicalizationMethod";
    pub const SIGNATURE_METHOD: &str = "SignatureMethod";
    pub const SIGNATURE_VALUE: &str = "SignatureValue";
    pub const DIGEST_METHOD: &str = "DigestMethod";
    pub const DIGEST_VALUE: &str = "DigestValue";
    pub const REFERENCE: &str = "Reference";
    pub const TRANSFORMS: &str = "Transforms";
    pub const TRANSFORM: &str = "Transform";
    pub const KEY_INFO: &str = "KeyInfo";

    // SMEV message elements
    pub const MESSAGE: &str = "Message";
    pub const MESSAGE_DATA: &str = "MessageData";
    pub const SENDER: &str = "Sender";
    pub const RECIPIENT: &str = "Recipient";
    pub const ORIGINATOR: &str = "Originator";
    pub const SERVICE: &str = "Service";
    pub const SERVICE_NAME: &str = "ServiceName";
    pub const MNEMONIC: &str = "Mnemonic";
    pub const VERSION: &str = "Version";
    pub const CODE: &str = "Code";
    pub const NAME: &str = "Name";
    pub const TYPE_CODE: &str = "TypeCode";
    pub const STATUS: &str = "Status";
    pub const DATE: &str = "Date";
    pub const EXCHANGE_TYPE: &str = "ExchangeType";
    pub const TEST_MSG: &str = "TestMsg";
    pub const CASE_NUMBER: &str = "CaseNumber";
    pub const APP_DATA: &str = "AppData";
    pub const APP_DOCUMENT: &str = "AppDocument";
    pub const REQUEST_CODE: &str = "RequestCode";
    pub const BINARY_DATA: &str = "BinaryData";
}

/// Attribute names.
pub mod attr {
    pub const ID: &str = "Id";
    pub const URI: &str = "URI";
    pub const ACTOR: &str = "actor";
    pub const ALGORITHM: &str = "Algorithm";
    pub const ENCODING_TYPE: &str = "EncodingType";
    pub const VALUE_TYPE: &str = "ValueType";
}
