//! Small roxmltree helpers shared by the PMML parsers.
//!
//! Every helper reports failures through [`PmmlError`] with the element
//! and attribute names spelled out; a PMML load error has to tell the
//! operator which construct the document tripped over.

use roxmltree::Node;

use super::PmmlError;

/// Element children of a node, skipping text and comments.
pub(crate) fn element_children<'a, 'd>(node: Node<'a, 'd>) -> impl Iterator<Item = Node<'a, 'd>> {
    node.children().filter(|n| n.is_element())
}

/// First element child with the given tag name.
pub(crate) fn find_child<'a, 'd>(node: Node<'a, 'd>, name: &str) -> Option<Node<'a, 'd>> {
    element_children(node).find(|n| n.tag_name().name() == name)
}

/// Like [`find_child`], but the element is required.
pub(crate) fn require_child<'a, 'd>(
    node: Node<'a, 'd>,
    name: &'static str,
) -> Result<Node<'a, 'd>, PmmlError> {
    find_child(node, name).ok_or_else(|| PmmlError::MissingElement {
        element: name,
        parent: node.tag_name().name().to_owned(),
    })
}

/// A required string attribute.
pub(crate) fn require_attr<'a>(node: Node<'a, '_>, name: &'static str) -> Result<&'a str, PmmlError> {
    node.attribute(name).ok_or_else(|| PmmlError::MissingAttribute {
        attribute: name,
        element: node.tag_name().name().to_owned(),
    })
}

/// A required f64 attribute.
pub(crate) fn require_f64(node: Node<'_, '_>, name: &'static str) -> Result<f64, PmmlError> {
    parse_f64(node, name, require_attr(node, name)?)
}

/// An optional f64 attribute; absence is fine, garbage is not.
pub(crate) fn opt_f64(node: Node<'_, '_>, name: &'static str) -> Result<Option<f64>, PmmlError> {
    node.attribute(name)
        .map(|raw| parse_f64(node, name, raw))
        .transpose()
}

fn parse_f64(node: Node<'_, '_>, name: &'static str, raw: &str) -> Result<f64, PmmlError> {
    raw.trim().parse::<f64>().map_err(|_| PmmlError::InvalidNumber {
        attribute: name,
        element: node.tag_name().name().to_owned(),
        value: raw.to_owned(),
    })
}

/// Tokens of a PMML `<Array>` element: whitespace separated, entries may
/// be double-quoted to protect embedded spaces.
pub(crate) fn array_tokens(node: Node<'_, '_>) -> Vec<String> {
    let text = node.text().unwrap_or_default();
    let mut tokens = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('"') {
            let end = stripped.find('"').unwrap_or(stripped.len());
            tokens.push(stripped[..end].to_owned());
            rest = stripped[end..].trim_start_matches('"').trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(rest[..end].to_owned());
            rest = rest[end..].trim_start();
        }
    }
    tokens
}
