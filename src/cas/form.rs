//! Locates the service-ticket endpoint inside a TGT response page.

use html5ever::{driver::ParseOpts, parse_document, tendril::TendrilSink};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::CasError;

/// Returns the `action` of the first `form` element in `html`.
///
/// A page without a form is what CAS serves when it rejects the credentials,
/// so this never falls back to an empty URL.
pub fn extract_form_action(html: &[u8]) -> Result<String, CasError> {
    let text = String::from_utf8_lossy(html);
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(&*text);

    let form = find_first_element(&dom.document, "form").ok_or(CasError::MissingForm)?;
    match attribute(&form, "action") {
        Some(action) if !action.is_empty() => Ok(action),
        _ => Err(CasError::MissingAction),
    }
}

fn find_first_element(node: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data {
        if &*name.local == tag {
            return Some(node.clone());
        }
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_first_element(child, tag))
}

fn attribute(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == key)
            .map(|attr| String::from(&*attr.value)),
        _ => None,
    }
}
