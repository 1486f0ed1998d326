//! Static subtree descriptors and their materialization.

use std::borrow::Cow;

use crate::layer::AttributeSlot;
use crate::lookahead::{PoolId, Want};
use crate::markup::decode_entities;
use crate::{AttrKey, LayerId, NodeId, Pass, PositionId, RenderError};

/// One node of a template's static structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Text(String),
    Element(ElementSpec),
    /// Placeholder for the dynamic position with this id; becomes its anchor.
    Anchor(PositionId),
    Doctype,
}

impl Child {
    pub fn text(text: impl Into<String>) -> Self {
        Child::Text(text.into())
    }

    pub fn element(tag: impl Into<String>) -> ElementSpec {
        ElementSpec {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            key: None,
        }
    }

    pub fn anchor(position: PositionId) -> Self {
        Child::Anchor(position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Child>,
    /// Registers the element for dynamic attributes under this key.
    pub key: Option<AttrKey>,
}

impl ElementSpec {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn keyed(mut self, key: AttrKey) -> Self {
        self.key = Some(key);
        self
    }
}

impl From<ElementSpec> for Child {
    fn from(spec: ElementSpec) -> Self {
        Child::Element(spec)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::text(text)
    }
}

impl Pass<'_> {
    /// Materializes `children`, claiming matching nodes from `pool`. Returned
    /// top-level nodes that came from the pool may still be attached
    /// elsewhere; fresh ones are detached.
    pub(crate) fn create_nodes(
        &mut self,
        layer: LayerId,
        children: &[Child],
        pool: PoolId,
    ) -> Result<Vec<NodeId>, RenderError> {
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Child::Text(text) => nodes.push(self.create_text_node(text, pool)?),
                Child::Element(spec) => nodes.push(self.create_element(layer, spec, pool)?),
                Child::Anchor(position) => {
                    let anchor = self.applier.create_comment(&position.to_string());
                    let record = self.store.get_mut(layer)?;
                    record.anchors.insert(*position, anchor);
                    record.lookahead.insert(*position, pool);
                    nodes.push(anchor);
                }
                Child::Doctype => {}
            }
        }
        Ok(nodes)
    }

    fn create_text_node(&mut self, text: &str, pool: PoolId) -> Result<NodeId, RenderError> {
        let content = if text.contains('&') {
            Cow::Owned(decode_entities(text))
        } else {
            Cow::Borrowed(text)
        };
        match self.pools.take_match(&*self.applier, pool, Want::Text) {
            Some(node) => {
                self.applier.set_text(node, &content)?;
                Ok(node)
            }
            None => Ok(self.applier.create_text(&content)),
        }
    }

    fn create_element(
        &mut self,
        layer: LayerId,
        spec: &ElementSpec,
        pool: PoolId,
    ) -> Result<NodeId, RenderError> {
        let (element, reused) = match self
            .pools
            .take_match(&*self.applier, pool, Want::Element(&spec.tag))
        {
            Some(reused) => {
                log::trace!("reusing <{}> node {reused}", spec.tag);
                (reused, true)
            }
            None => (self.applier.create_element(&spec.tag), false),
        };
        for (name, value) in &spec.attributes {
            self.applier.set_attribute(element, name, value)?;
        }
        if let Some(key) = spec.key {
            self.store
                .get_mut(layer)?
                .attributes
                .insert(key, AttributeSlot::new(element));
        }
        if !reused && spec.children.is_empty() {
            return Ok(element);
        }

        // A reused node's children go into a pool even when the descriptor
        // has none, so unmatched ones are pruned with the rest.
        let existing = self.applier.children(element);
        let mut next = existing.first().copied();
        let child_pool = self.pools.alloc(existing);
        for node in self.create_nodes(layer, &spec.children, child_pool)? {
            if self.applier.parent(node).is_none() {
                self.applier.insert_before(element, node, next)?;
            } else {
                next = self.applier.next_sibling(node);
            }
        }
        Ok(element)
    }

    /// Runs a create instruction: builds the subtree and places it after the
    /// position's anchor.
    pub(crate) fn create(
        &mut self,
        layer: LayerId,
        position: PositionId,
        children: &[Child],
    ) -> Result<(), RenderError> {
        let pool = self.store.get(layer)?.pool_for(position);
        let nodes = self.create_nodes(layer, children, pool)?;
        self.store.get_mut(layer)?.elements.insert(position, nodes);
        self.insert_layer_elements(layer, position)
    }
}

#[cfg(test)]
#[path = "tests/assembler_tests.rs"]
mod tests;
