//! Markup handling for text content.
//!
//! Static text is entity-decoded once when its node is created; dynamic text
//! that carries markup is parsed into a fragment and materialized as real
//! nodes.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::{Applier, NodeError, NodeId};

/// A parsed node, detached from any output tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
    Comment(String),
}

/// Whether text must go through the parser rather than become a single text
/// node.
pub fn has_markup(content: &str) -> bool {
    content.contains('<') || content.contains('&')
}

/// Parses `html` as body content.
pub fn parse_fragment(html: &str) -> Vec<Fragment> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut fragments = Vec::new();
    collect_body(&dom.document, &mut fragments);
    fragments
}

/// Resolves character references without interpreting tags, the way a
/// `textarea` treats its content.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut decoded = String::with_capacity(text.len());
    for fragment in parse_fragment(&text.replace('<', "&lt;")) {
        push_text(&fragment, &mut decoded);
    }
    decoded
}

/// Creates output nodes for `fragments`, returning the top-level ones in
/// order. Nothing is attached to the tree yet.
pub fn materialize(
    applier: &mut dyn Applier,
    fragments: &[Fragment],
) -> Result<Vec<NodeId>, NodeError> {
    let mut nodes = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        nodes.push(materialize_one(applier, fragment)?);
    }
    Ok(nodes)
}

fn materialize_one(applier: &mut dyn Applier, fragment: &Fragment) -> Result<NodeId, NodeError> {
    match fragment {
        Fragment::Text(text) => Ok(applier.create_text(text)),
        Fragment::Comment(data) => Ok(applier.create_comment(data)),
        Fragment::Element {
            tag,
            attributes,
            children,
        } => {
            let element = applier.create_element(tag);
            for (name, value) in attributes {
                applier.set_attribute(element, name, value)?;
            }
            for child in children {
                let node = materialize_one(applier, child)?;
                applier.insert_before(element, node, None)?;
            }
            Ok(element)
        }
    }
}

fn collect_body(handle: &Handle, out: &mut Vec<Fragment>) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Element { name, .. }
                if matches!(&*name.local, "html" | "head" | "body") =>
            {
                collect_body(child, out)
            }
            _ => out.extend(convert(child)),
        }
    }
}

fn convert(handle: &Handle) -> Option<Fragment> {
    match &handle.data {
        NodeData::Text { contents } => Some(Fragment::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Fragment::Comment(contents.to_string())),
        NodeData::Element { name, attrs, .. } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            let children = handle.children.borrow().iter().filter_map(convert).collect();
            Some(Fragment::Element {
                tag: name.local.to_string(),
                attributes,
                children,
            })
        }
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
            None
        }
    }
}

fn push_text(fragment: &Fragment, out: &mut String) {
    match fragment {
        Fragment::Text(text) => out.push_str(text),
        Fragment::Comment(_) => {}
        Fragment::Element { children, .. } => {
            for child in children {
                push_text(child, out);
            }
        }
    }
}
