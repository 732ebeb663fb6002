//! Namespace-aware lookup helpers over parsed documents. Thin conveniences
//! used by the signing and verification pipelines.

/// First descendant element matching `(ns_uri, local_name)`.
pub fn find_element<'a>(
    doc: &'a roxmltree::Document<'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    })
}

/// First descendant of `scope` (self excluded) matching `(ns_uri, local_name)`.
pub fn find_descendant<'a>(
    scope: roxmltree::Node<'a, 'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    scope.descendants().skip(1).find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    })
}

/// First direct child of `parent` matching `(ns_uri, local_name)`.
pub fn find_child<'a>(
    parent: roxmltree::Node<'a, 'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    parent.children().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    })
}

/// First descendant element carrying `(attr_ns, attr_name) = value`.
pub fn find_by_attribute<'a>(
    doc: &'a roxmltree::Document<'a>,
    attr_ns: &str,
    attr_name: &str,
    value: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants().find(|n| {
        n.is_element() && n.attribute((attr_ns, attr_name)) == Some(value)
    })
}

/// Trimmed text content of a node, empty when absent.
pub fn element_text<'a>(node: roxmltree::Node<'a, 'a>) -> &'a str {
    node.text().unwrap_or("").trim()
}
