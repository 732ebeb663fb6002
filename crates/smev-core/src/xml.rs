//! # Typed XML Tree-Builder
//!
//! `XmlElement` is the construction side of the stack: signature headers,
//! envelope skeletons, and attachment manifests are assembled as owned
//! trees and serialized to text. Content is a tagged variant — either a
//! text scalar or an ordered list of child elements — and the namespace
//! prefix of an element is scoped to that element, inherited by children
//! only when they are built with [`XmlElement::inherited`].
//!
//! Namespace declarations are resolved at serialization time: every prefix
//! used in the subtree is declared on the root element, from explicit
//! [`XmlElement::declare_ns`] bindings first and the fixed protocol table
//! ([`crate::ns::NS_TABLE`]) otherwise. This mirrors the wire format, where
//! the envelope root carries the full declaration map.
//!
//! The parse side ([`XmlElement::from_document`]) converts a read-only
//! `roxmltree` document into an owned tree so that transforms (header
//! attachment, digest splicing, version conversion) can mutate a copy and
//! re-serialize, leaving the caller's input untouched.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::XmlError;
use crate::ns;

/// Namespace scope of a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NsScope {
    /// The element has no namespace.
    None,
    /// The element uses the effective prefix of its parent (which may be
    /// no namespace at all).
    Inherit,
    /// The element uses the given prefix.
    Prefix(String),
}

/// A single attribute: optional prefix, local name, value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttr {
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

/// Element content: a text scalar or an ordered list of child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    Text(String),
    Elements(Vec<XmlElement>),
}

/// An owned XML element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    scope: NsScope,
    name: String,
    attrs: Vec<XmlAttr>,
    content: XmlContent,
    /// Extra prefix → URI declarations emitted on this element. The empty
    /// prefix stands for the default namespace.
    ns_decls: Vec<(String, String)>,
}

impl XmlElement {
    /// Create an element with no namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scope: NsScope::None,
            name: name.into(),
            attrs: Vec::new(),
            content: XmlContent::Elements(Vec::new()),
            ns_decls: Vec::new(),
        }
    }

    /// Create an element bound to a namespace prefix.
    pub fn ns(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.scope = NsScope::Prefix(prefix.into());
        el
    }

    /// Create an element that inherits the effective prefix of its parent.
    pub fn inherited(name: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.scope = NsScope::Inherit;
        el
    }

    /// Set text content (builder style).
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = XmlContent::Text(text.into());
        self
    }

    /// Append an unprefixed attribute (builder style).
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(XmlAttr {
            prefix: None,
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a prefixed attribute (builder style).
    pub fn ns_attr(
        mut self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attrs.push(XmlAttr {
            prefix: Some(prefix.into()),
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a child element (builder style).
    pub fn child(mut self, child: XmlElement) -> Self {
        self.push_child(child);
        self
    }

    /// Append several child elements (builder style).
    pub fn children(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        for c in children {
            self.push_child(c);
        }
        self
    }

    /// Declare an explicit prefix → URI binding on this element. An empty
    /// prefix declares the default namespace.
    pub fn declare_ns(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.ns_decls.push((prefix.into(), uri.into()));
        self
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace scope of the element.
    pub fn scope(&self) -> &NsScope {
        &self.scope
    }

    /// Text content, if this element holds a text scalar.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            XmlContent::Text(t) => Some(t),
            XmlContent::Elements(_) => None,
        }
    }

    /// Child elements (empty slice for text content).
    pub fn child_elements(&self) -> &[XmlElement] {
        match &self.content {
            XmlContent::Elements(els) => els,
            XmlContent::Text(_) => &[],
        }
    }

    /// Mutable child element list, if this element holds elements.
    pub fn child_elements_mut(&mut self) -> Option<&mut Vec<XmlElement>> {
        match &mut self.content {
            XmlContent::Elements(els) => Some(els),
            XmlContent::Text(_) => None,
        }
    }

    /// Value of an attribute by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Replace the content with a text scalar.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = XmlContent::Text(text.into());
    }

    /// Append a child element, replacing text content if present.
    pub fn push_child(&mut self, child: XmlElement) {
        match &mut self.content {
            XmlContent::Elements(els) => els.push(child),
            XmlContent::Text(_) => self.content = XmlContent::Elements(vec![child]),
        }
    }

    /// First direct child with the given local name.
    pub fn child_named(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().iter().find(|c| c.name == name)
    }

    /// Mutable first direct child with the given local name.
    pub fn child_named_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.child_elements_mut()?
            .iter_mut()
            .find(|c| c.name == name)
    }

    /// First descendant (depth-first, self excluded) with the given local name.
    pub fn find_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable first descendant (depth-first, self excluded) with the given
    /// local name.
    pub fn find_descendant_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        let els = self.child_elements_mut()?;
        for child in els.iter_mut() {
            if child.name == name {
                return Some(child);
            }
            if child.find_descendant(name).is_some() {
                return child.find_descendant_mut(name);
            }
        }
        None
    }

    /// Whether a descendant with the given local name exists.
    pub fn has_descendant(&self, name: &str) -> bool {
        self.find_descendant(name).is_some()
    }

    /// Serialize to a compact XML string. Every prefix used in the subtree
    /// is declared on this element, resolved from explicit declarations
    /// first and the protocol table otherwise.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let decls = self.resolve_declarations()?;
        let mut out = String::new();
        self.write(&mut out, &decls, None, 0, false);
        Ok(out)
    }

    /// Serialize to an indented XML string (two-space indent). Used for
    /// human-auditable artifacts such as the attachment manifest.
    pub fn to_pretty_xml(&self) -> Result<String, XmlError> {
        let decls = self.resolve_declarations()?;
        let mut out = String::new();
        self.write(&mut out, &decls, None, 0, true);
        out.push('\n');
        Ok(out)
    }

    /// Convert a parsed document into an owned tree. All namespace bindings
    /// found in the document are recorded as explicit declarations on the
    /// root so that re-serialization preserves foreign prefixes.
    pub fn from_document(doc: &roxmltree::Document<'_>) -> Result<Self, XmlError> {
        let mut bindings: BTreeMap<String, String> = BTreeMap::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            for nsdecl in node.namespaces() {
                let prefix = nsdecl.name().unwrap_or("").to_string();
                if prefix == "xml" {
                    continue;
                }
                let uri = nsdecl.uri().to_string();
                match bindings.get(&prefix) {
                    Some(existing) if *existing != uri => {
                        return Err(XmlError::PrefixConflict(prefix));
                    }
                    _ => {
                        bindings.insert(prefix, uri);
                    }
                }
            }
        }
        let mut root = Self::from_node(doc.root_element(), &bindings)?;
        root.ns_decls = bindings.into_iter().collect();
        Ok(root)
    }

    /// Parse an XML string into an owned tree.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| XmlError::Parse(e.to_string()))?;
        Self::from_document(&doc)
    }

    fn from_node(
        node: roxmltree::Node<'_, '_>,
        bindings: &BTreeMap<String, String>,
    ) -> Result<Self, XmlError> {
        let scope = match node.tag_name().namespace() {
            None => NsScope::None,
            Some(uri) => NsScope::Prefix(prefix_for(bindings, uri)?),
        };
        let mut attrs = Vec::new();
        for attr in node.attributes() {
            let prefix = match attr.namespace() {
                None => None,
                Some(ns::XML) => Some("xml".to_string()),
                Some(uri) => Some(prefix_for(bindings, uri)?),
            };
            attrs.push(XmlAttr {
                prefix,
                name: attr.name().to_string(),
                value: attr.value().to_string(),
            });
        }

        let element_children: Vec<roxmltree::Node<'_, '_>> =
            node.children().filter(|c| c.is_element()).collect();
        let content = if element_children.is_empty() {
            match node.text() {
                Some(t) if !t.is_empty() => XmlContent::Text(t.to_string()),
                _ => XmlContent::Elements(Vec::new()),
            }
        } else {
            let mut els = Vec::with_capacity(element_children.len());
            for child in element_children {
                els.push(Self::from_node(child, bindings)?);
            }
            XmlContent::Elements(els)
        };

        Ok(Self {
            scope,
            name: node.tag_name().name().to_string(),
            attrs,
            content,
            ns_decls: Vec::new(),
        })
    }

    /// Collect every prefix used in the subtree and resolve it to a URI.
    fn resolve_declarations(&self) -> Result<Vec<(String, String)>, XmlError> {
        let mut used: BTreeSet<String> = BTreeSet::new();
        self.collect_prefixes(None, &mut used);

        let mut decls: BTreeMap<String, String> = self
            .ns_decls
            .iter()
            .map(|(p, u)| (p.clone(), u.clone()))
            .collect();
        for prefix in used {
            if prefix == "xml" || decls.contains_key(&prefix) {
                continue;
            }
            match ns::uri_for_prefix(&prefix) {
                Some(uri) => {
                    decls.insert(prefix, uri.to_string());
                }
                None => return Err(XmlError::UnknownPrefix(prefix)),
            }
        }
        Ok(decls.into_iter().collect())
    }

    fn collect_prefixes(&self, inherited: Option<&str>, used: &mut BTreeSet<String>) {
        let effective = self.effective_prefix(inherited);
        if let Some(p) = effective {
            used.insert(p.to_string());
        }
        for attr in &self.attrs {
            if let Some(p) = &attr.prefix {
                used.insert(p.clone());
            }
        }
        for child in self.child_elements() {
            child.collect_prefixes(effective, used);
        }
    }

    fn effective_prefix<'a>(&'a self, inherited: Option<&'a str>) -> Option<&'a str> {
        match &self.scope {
            NsScope::None => None,
            NsScope::Inherit => inherited,
            NsScope::Prefix(p) => Some(p.as_str()),
        }
    }

    fn qname(&self, inherited: Option<&str>) -> String {
        match self.effective_prefix(inherited) {
            Some(p) => format!("{p}:{}", self.name),
            None => self.name.clone(),
        }
    }

    fn write(
        &self,
        out: &mut String,
        decls: &[(String, String)],
        inherited: Option<&str>,
        depth: usize,
        pretty: bool,
    ) {
        if pretty && depth > 0 {
            out.push('\n');
            for _ in 0..depth {
                out.push_str("  ");
            }
        }
        let qname = self.qname(inherited);
        out.push('<');
        out.push_str(&qname);
        for (prefix, uri) in decls {
            if prefix.is_empty() {
                out.push_str(" xmlns=\"");
            } else {
                out.push_str(" xmlns:");
                out.push_str(prefix);
                out.push_str("=\"");
            }
            out.push_str(&escape_attr(uri));
            out.push('"');
        }
        for attr in &self.attrs {
            out.push(' ');
            if let Some(p) = &attr.prefix {
                out.push_str(p);
                out.push(':');
            }
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape_attr(&attr.value));
            out.push('"');
        }
        let effective = self.effective_prefix(inherited);
        match &self.content {
            XmlContent::Text(t) => {
                out.push('>');
                out.push_str(&escape_text(t));
                out.push_str("</");
                out.push_str(&qname);
                out.push('>');
            }
            XmlContent::Elements(els) if els.is_empty() => {
                out.push_str("/>");
            }
            XmlContent::Elements(els) => {
                out.push('>');
                for child in els {
                    child.write(out, &[], effective, depth + 1, pretty);
                }
                if pretty {
                    out.push('\n');
                    for _ in 0..depth {
                        out.push_str("  ");
                    }
                }
                out.push_str("</");
                out.push_str(&qname);
                out.push('>');
            }
        }
    }
}

fn prefix_for(bindings: &BTreeMap<String, String>, uri: &str) -> Result<String, XmlError> {
    // Prefer a named prefix; an entry under the empty key is the default
    // namespace, which owned elements do not model.
    bindings
        .iter()
        .find(|(p, u)| !p.is_empty() && u.as_str() == uri)
        .map(|(p, _)| p.clone())
        .ok_or_else(|| XmlError::UnknownPrefix(uri.to_string()))
}

/// Escape character data: `&`, `<`, `>` and CR.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape an attribute value: `&`, `<`, `"` and whitespace controls.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            other => out.push(other),
        }
    }
    out
}
