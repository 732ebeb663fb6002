//! # Exclusive Canonicalization — Canonical Byte Production
//!
//! This module defines `CanonicalXml`, the sole construction path for bytes
//! used in digest and signature computation across the entire stack.
//!
//! ## Security Invariant
//!
//! The `CanonicalXml` newtype has a private inner field. The only way to
//! construct it is through the canonicalization constructors, which apply
//! exclusive XML canonicalization without comments to a parsed subtree.
//! Any function feeding a digest or signature must accept `&CanonicalXml`
//! or its bytes, and the only way to produce one is through this pipeline.
//!
//! ## Canonical Form
//!
//! The serialization follows exclusive canonicalization (the algorithm the
//! signature header names in its `CanonicalizationMethod`):
//!
//! - comments are dropped; processing instructions are kept;
//! - namespace declarations are emitted only on elements where the prefix
//!   is visibly utilized and not already emitted by an output ancestor,
//!   sorted by prefix, with the default namespace first;
//! - attributes are sorted by namespace URI then local name, attributes
//!   without a namespace first;
//! - character data escapes `&`, `<`, `>` and CR; attribute values escape
//!   `&`, `<`, `"`, TAB, LF and CR as character references;
//! - the result is byte-identical across runs for identical logical trees
//!   regardless of source attribute order or whitespace inside tags.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CanonicalizationError;
use crate::ns;
use crate::xml::{escape_attr, escape_text};

/// Bytes produced exclusively by the canonicalization pipeline.
///
/// # Invariants
///
/// - The only constructors are [`CanonicalXml::of_node`] and
///   [`CanonicalXml::of_document_str`].
/// - The byte sequence is the exclusive canonical form of the subtree.
///
/// These invariants are enforced by the constructors and cannot be violated
/// by downstream code because the inner `Vec<u8>` is private.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalXml(Vec<u8>);

impl CanonicalXml {
    /// Canonicalize the subtree rooted at `node`.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::Malformed` if `node` is not an
    /// element, and `CanonicalizationError::MissingBinding` if a prefix is
    /// used without an in-scope namespace binding.
    pub fn of_node(node: roxmltree::Node<'_, '_>) -> Result<Self, CanonicalizationError> {
        if !node.is_element() {
            return Err(CanonicalizationError::Malformed(
                "canonicalization root must be an element".into(),
            ));
        }
        let mut out = Vec::new();
        render_element(node, &BTreeMap::new(), &mut out)?;
        Ok(Self(out))
    }

    /// Parse a document and canonicalize its root element.
    pub fn of_document_str(xml: &str) -> Result<Self, CanonicalizationError> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|e| CanonicalizationError::Parse(e.to_string()))?;
        Self::of_node(doc.root_element())
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalXml {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Render one element. `rendered` maps prefixes to the URIs already emitted
/// by output ancestors; the empty prefix stands for the default namespace.
fn render_element(
    node: roxmltree::Node<'_, '_>,
    rendered: &BTreeMap<String, String>,
    out: &mut Vec<u8>,
) -> Result<(), CanonicalizationError> {
    let prefix = element_prefix(node)?;
    let qname = match &prefix {
        Some(p) => format!("{p}:{}", node.tag_name().name()),
        None => node.tag_name().name().to_string(),
    };
    out.push(b'<');
    out.extend_from_slice(qname.as_bytes());

    // Visibly utilized prefixes: the element's own plus those of its
    // namespaced attributes.
    let mut visible: BTreeSet<String> = BTreeSet::new();
    visible.insert(prefix.clone().unwrap_or_default());
    for attr in node.attributes() {
        match attr.namespace() {
            Some(ns::XML) | None => {}
            Some(uri) => {
                visible.insert(attribute_prefix(node, uri)?);
            }
        }
    }

    let mut rendered_here = rendered.clone();
    for p in &visible {
        let bound = if p.is_empty() {
            node.lookup_namespace_uri(None)
        } else {
            node.lookup_namespace_uri(Some(p.as_str()))
        };
        match bound {
            Some(uri) => {
                if rendered_here.get(p).map(String::as_str) != Some(uri) {
                    if p.is_empty() {
                        out.extend_from_slice(b" xmlns=\"");
                    } else {
                        out.extend_from_slice(b" xmlns:");
                        out.extend_from_slice(p.as_bytes());
                        out.extend_from_slice(b"=\"");
                    }
                    out.extend_from_slice(escape_attr(uri).as_bytes());
                    out.push(b'"');
                    rendered_here.insert(p.clone(), uri.to_string());
                }
            }
            None if p.is_empty() => {
                // Unprefixed, un-namespaced element below a rendered default
                // namespace must undeclare it.
                if rendered_here.get("").map(|u| !u.is_empty()).unwrap_or(false) {
                    out.extend_from_slice(b" xmlns=\"\"");
                    rendered_here.insert(String::new(), String::new());
                }
            }
            None => return Err(CanonicalizationError::MissingBinding(p.clone())),
        }
    }

    // Attributes sorted by (namespace URI, local name); the empty URI of
    // unqualified attributes sorts first.
    let mut attrs: Vec<_> = node.attributes().collect();
    attrs.sort_by(|a, b| {
        (a.namespace().unwrap_or(""), a.name()).cmp(&(b.namespace().unwrap_or(""), b.name()))
    });
    for attr in attrs {
        let attr_qname = match attr.namespace() {
            None => attr.name().to_string(),
            Some(ns::XML) => format!("xml:{}", attr.name()),
            Some(uri) => format!("{}:{}", attribute_prefix(node, uri)?, attr.name()),
        };
        out.push(b' ');
        out.extend_from_slice(attr_qname.as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape_attr(attr.value()).as_bytes());
        out.push(b'"');
    }
    out.push(b'>');

    for child in node.children() {
        if child.is_element() {
            render_element(child, &rendered_here, out)?;
        } else if child.is_text() {
            out.extend_from_slice(escape_text(child.text().unwrap_or("")).as_bytes());
        } else if child.is_pi() {
            let pi = child.pi().ok_or_else(|| {
                CanonicalizationError::Malformed("processing instruction without target".into())
            })?;
            out.extend_from_slice(b"<?");
            out.extend_from_slice(pi.target.as_bytes());
            if let Some(value) = pi.value {
                out.push(b' ');
                out.extend_from_slice(value.as_bytes());
            }
            out.extend_from_slice(b"?>");
        }
        // Comments are dropped.
    }

    out.extend_from_slice(b"</");
    out.extend_from_slice(qname.as_bytes());
    out.push(b'>');
    Ok(())
}

/// Prefix the element is serialized with. Elements bound through the
/// default namespace stay unprefixed; otherwise the in-scope prefix for the
/// element's namespace URI is used.
fn element_prefix(
    node: roxmltree::Node<'_, '_>,
) -> Result<Option<String>, CanonicalizationError> {
    match node.tag_name().namespace() {
        None => Ok(None),
        Some(ns::XML) => Ok(Some("xml".to_string())),
        Some(uri) => {
            if node.lookup_namespace_uri(None) == Some(uri) {
                return Ok(None);
            }
            node.namespaces()
                .find(|decl| decl.uri() == uri && decl.name().is_some())
                .and_then(|decl| decl.name())
                .map(|p| Some(p.to_string()))
                .ok_or_else(|| CanonicalizationError::MissingBinding(uri.to_string()))
        }
    }
}

/// Prefix bound to a namespaced attribute. Attributes never use the default
/// namespace, so a named binding must exist.
fn attribute_prefix(
    node: roxmltree::Node<'_, '_>,
    uri: &str,
) -> Result<String, CanonicalizationError> {
    node.namespaces()
        .find(|decl| decl.uri() == uri && decl.name().is_some())
        .and_then(|decl| decl.name())
        .map(str::to_string)
        .ok_or_else(|| CanonicalizationError::MissingBinding(uri.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(xml: &str) -> String {
        let c = CanonicalXml::of_document_str(xml).expect("should canonicalize");
        String::from_utf8(c.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_attribute_order_normalized() {
        let a = canon(r#"<Doc b="2" a="1"/>"#);
        let b = canon(r#"<Doc a="1" b="2"/>"#);
        assert_eq!(a, b);
        assert_eq!(a, r#"<Doc a="1" b="2"></Doc>"#);
    }

    #[test]
    fn test_whitespace_in_tags_normalized() {
        let a = canon("<Doc   a=\"1\"\n/>");
        assert_eq!(a, r#"<Doc a="1"></Doc>"#);
    }

    #[test]
    fn test_comments_stripped() {
        let a = canon("<Doc><!-- secret --><Child>v</Child></Doc>");
        assert_eq!(a, "<Doc><Child>v</Child></Doc>");
    }

    #[test]
    fn test_text_preserved_and_escaped() {
        let a = canon("<Doc>a &amp; b &lt; c</Doc>");
        assert_eq!(a, "<Doc>a &amp; b &lt; c</Doc>");
    }

    #[test]
    fn test_empty_element_expanded() {
        assert_eq!(canon("<Doc/>"), "<Doc></Doc>");
    }

    #[test]
    fn test_unused_namespace_dropped() {
        // Exclusive canonicalization drops declarations the subtree never
        // visibly utilizes.
        let a = canon(r#"<Doc xmlns:unused="http://example.com/u"><Child/></Doc>"#);
        assert_eq!(a, "<Doc><Child></Child></Doc>");
    }

    #[test]
    fn test_namespace_rendered_where_used() {
        let a = canon(
            r#"<root xmlns:a="http://example.com/a"><a:Child>v</a:Child></root>"#,
        );
        assert_eq!(
            a,
            r#"<root><a:Child xmlns:a="http://example.com/a">v</a:Child></root>"#
        );
    }

    #[test]
    fn test_namespace_not_rerendered_in_descendants() {
        let a = canon(
            r#"<a:root xmlns:a="http://example.com/a"><a:Child><a:Leaf>v</a:Leaf></a:Child></a:root>"#,
        );
        assert_eq!(
            a,
            r#"<a:root xmlns:a="http://example.com/a"><a:Child><a:Leaf>v</a:Leaf></a:Child></a:root>"#
        );
    }

    #[test]
    fn test_namespace_declarations_sorted_by_prefix() {
        let a = canon(
            r#"<z:r xmlns:z="http://example.com/z" xmlns:a="http://example.com/a" a:x="1"/>"#,
        );
        assert_eq!(
            a,
            r#"<z:r xmlns:a="http://example.com/a" xmlns:z="http://example.com/z" a:x="1"></z:r>"#
        );
    }

    #[test]
    fn test_attributes_sorted_unqualified_first() {
        let a = canon(
            r#"<r xmlns:n="http://example.com/n" n:a="2" b="1"/>"#,
        );
        assert_eq!(
            a,
            r#"<r xmlns:n="http://example.com/n" b="1" n:a="2"></r>"#
        );
    }

    #[test]
    fn test_default_namespace_rendered() {
        let a = canon(r#"<Doc xmlns="http://example.com/d"><Child/></Doc>"#);
        assert_eq!(
            a,
            r#"<Doc xmlns="http://example.com/d"><Child></Child></Doc>"#
        );
    }

    #[test]
    fn test_carriage_return_escaped_in_attribute() {
        let a = canon("<Doc a=\"x&#xD;y\"/>");
        assert_eq!(a, "<Doc a=\"x&#xD;y\"></Doc>");
    }

    #[test]
    fn test_non_element_root_rejected() {
        let doc = roxmltree::Document::parse("<Doc/>").unwrap();
        let result = CanonicalXml::of_node(doc.root());
        assert!(matches!(result, Err(CanonicalizationError::Malformed(_))));
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(matches!(
            CanonicalXml::of_document_str("<Doc><open></Doc>"),
            Err(CanonicalizationError::Parse(_))
        ));
    }

    #[test]
    fn test_subtree_pulls_down_ancestor_declarations() {
        // The body of an envelope canonicalized alone must re-declare the
        // prefixes it uses even though the source declared them at the root.
        let xml = r#"<e:Envelope xmlns:e="http://example.com/e" xmlns:m="http://example.com/m"><e:Body><m:Data>v</m:Data></e:Body></e:Envelope>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let body = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "Body")
            .unwrap();
        let c = CanonicalXml::of_node(body).unwrap();
        let s = String::from_utf8(c.as_bytes().to_vec()).unwrap();
        assert_eq!(
            s,
            r#"<e:Body xmlns:e="http://example.com/e"><m:Data xmlns:m="http://example.com/m">v</m:Data></e:Body>"#
        );
    }

    #[test]
    fn test_deterministic() {
        let xml = r#"<Doc b="2" a="1"><Child>text</Child></Doc>"#;
        assert_eq!(canon(xml), canon(xml));
    }
}
