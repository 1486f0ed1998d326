//! Output tree contract.
//!
//! The engine never owns the output tree; it drives it through [`Applier`].
//! Nodes are addressed by [`NodeId`] and come in three kinds: elements, text
//! and comments (the engine uses comments as position anchors). A host binds
//! the trait to its real tree; [`MemoryApplier`] is the in-memory arena used
//! by tests, benches and headless rendering.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::{NodeError, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

pub trait Applier {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    fn create_comment(&mut self, data: &str) -> NodeId;

    fn contains(&self, id: NodeId) -> bool;
    fn kind(&self, id: NodeId) -> Result<NodeKind, NodeError>;
    /// Tag name of an element, as created.
    fn tag_name(&self, id: NodeId) -> Result<&str, NodeError>;

    fn parent(&self, id: NodeId) -> Option<NodeId>;
    fn children(&self, id: NodeId) -> Vec<NodeId>;
    fn next_sibling(&self, id: NodeId) -> Option<NodeId>;
    fn previous_sibling(&self, id: NodeId) -> Option<NodeId>;

    fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Inserts `child` into `parent` before `reference`, or last when
    /// `reference` is `None`. An attached `child` is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError>;
    /// Detaches a node and releases it together with its subtree.
    fn remove(&mut self, id: NodeId) -> Result<(), NodeError>;

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), NodeError>;
    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    /// Removes the string attribute and resets the boolean property of the
    /// same name.
    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), NodeError>;
    fn set_property(&mut self, id: NodeId, name: &str, value: bool) -> Result<(), NodeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        properties: IndexMap<String, bool>,
    },
    Text(String),
    Comment(String),
}

impl NodeData {
    fn kind(&self) -> NodeKind {
        match self {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }
}

#[derive(Debug)]
struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Structural operations performed on a [`MemoryApplier`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationStats {
    pub elements_created: usize,
    pub texts_created: usize,
    pub comments_created: usize,
    pub inserts: usize,
    pub removals: usize,
}

impl MutationStats {
    /// Element and text creations; anchors are not counted.
    pub fn content_created(&self) -> usize {
        self.elements_created + self.texts_created
    }
}

#[derive(Default)]
pub struct MemoryApplier {
    nodes: Vec<Option<MemoryNode>>,
    stats: MutationStats,
}

impl MemoryApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    pub fn data(&self, id: NodeId) -> Result<&NodeData, NodeError> {
        Ok(&self.node(id)?.data)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id) {
            Ok(NodeData::Element { attributes, .. }) => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<bool> {
        match self.data(id) {
            Ok(NodeData::Element { properties, .. }) => properties.get(name).copied(),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Ok(NodeData::Text(text)) | Ok(NodeData::Comment(text)) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of a subtree, comments excluded.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else { return };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            NodeData::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Ok(node) = self.node(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        let _ = match &node.data {
            NodeData::Element {
                tag, attributes, ..
            } => {
                let attrs: String = attributes
                    .iter()
                    .map(|(name, value)| format!(" {name}=\"{value}\""))
                    .collect();
                writeln!(output, "{indent}[{id}] <{tag}{attrs}>")
            }
            NodeData::Text(text) => writeln!(output, "{indent}[{id}] {text:?}"),
            NodeData::Comment(data) => writeln!(output, "{indent}[{id}] <!--{data}-->"),
        };
        for &child in &node.children {
            self.dump_node(output, child, depth + 1);
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(MemoryNode {
            data,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, NodeError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, NodeError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(NodeError::Missing { id })
    }

    fn element_mut(
        &mut self,
        id: NodeId,
    ) -> Result<(&mut IndexMap<String, String>, &mut IndexMap<String, bool>), NodeError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element {
                attributes,
                properties,
                ..
            } => Ok((attributes, properties)),
            _ => Err(NodeError::TypeMismatch {
                id,
                expected: "element",
            }),
        }
    }

    fn sibling(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.node(id).ok()?.parent?;
        let siblings = &self.node(parent).ok()?.children;
        let index = siblings.iter().position(|&child| child == id)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).copied()
    }

    fn unlink(&mut self, id: NodeId) -> Result<(), NodeError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        if let Ok(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|&child| child != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.node(id).ok().and_then(|node| node.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}

impl Applier for MemoryApplier {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.stats.elements_created += 1;
        self.push(NodeData::Element {
            tag: tag.to_owned(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.stats.texts_created += 1;
        self.push(NodeData::Text(text.to_owned()))
    }

    fn create_comment(&mut self, data: &str) -> NodeId {
        self.stats.comments_created += 1;
        self.push(NodeData::Comment(data.to_owned()))
    }

    fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    fn kind(&self, id: NodeId) -> Result<NodeKind, NodeError> {
        Ok(self.node(id)?.data.kind())
    }

    fn tag_name(&self, id: NodeId) -> Result<&str, NodeError> {
        match &self.node(id)?.data {
            NodeData::Element { tag, .. } => Ok(tag),
            _ => Err(NodeError::TypeMismatch {
                id,
                expected: "element",
            }),
        }
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.parent
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling(id, 1)
    }

    fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling(id, -1)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError> {
        if reference == Some(child) {
            return Ok(());
        }
        self.node(child)?;
        if self.is_ancestor(child, parent) {
            return Err(NodeError::Cycle { parent, child });
        }
        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(NodeError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }
        self.node(parent)?;
        self.unlink(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = reference
            .and_then(|reference| siblings.iter().position(|&id| id == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.stats.inserts += 1;
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> Result<(), NodeError> {
        self.unlink(id)?;
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            if let Ok(node) = self.node_mut(child) {
                node.parent = None;
            }
            // Ignore errors if child is already removed
            let _ = self.remove(child);
        }
        if let Some(slot) = self.nodes.get_mut(id) {
            slot.take();
        }
        self.stats.removals += 1;
        Ok(())
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), NodeError> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(current) | NodeData::Comment(current) => {
                text.clone_into(current);
                Ok(())
            }
            NodeData::Element { .. } => Err(NodeError::TypeMismatch {
                id,
                expected: "text",
            }),
        }
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        let (attributes, _) = self.element_mut(id)?;
        attributes.insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), NodeError> {
        let (attributes, properties) = self.element_mut(id)?;
        attributes.shift_remove(name);
        properties.shift_remove(name);
        Ok(())
    }

    fn set_property(&mut self, id: NodeId, name: &str, value: bool) -> Result<(), NodeError> {
        let (_, properties) = self.element_mut(id)?;
        properties.insert(name.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/applier_tests.rs"]
mod tests;
