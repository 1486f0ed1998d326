//! Anchors and ordered placement of a position's nodes.
//!
//! A layer's top-level output forms one contiguous run of siblings inside
//! its container, starting right after its origin. Within that run each
//! position's nodes follow its anchor, and positions appear in id order.

use crate::layer::{Layer, LayerStore};
use crate::{Applier, LayerId, NodeId, NodeKind, Pass, PositionId, RenderError};

impl Pass<'_> {
    /// Returns the attached anchor of `position`, creating and placing one if
    /// needed.
    pub(crate) fn ensure_anchor(
        &mut self,
        layer: LayerId,
        position: PositionId,
    ) -> Result<NodeId, RenderError> {
        let record = self.store.get(layer)?;
        if let Some(&anchor) = record.anchors.get(&position) {
            if self.applier.parent(anchor).is_some() {
                return Ok(anchor);
            }
        }

        let container = record.container;
        let reference = match self.preceding_tail(record, position) {
            Some(tail) => self.applier.next_sibling(tail),
            None => match record.origin {
                Some(origin) => self.applier.next_sibling(origin),
                None => self.applier.first_child(container),
            },
        };
        let anchor = self.applier.create_comment(&position.to_string());
        self.applier.insert_before(container, anchor, reference)?;
        let record = self.store.get_mut(layer)?;
        record.anchors.insert(position, anchor);
        record.placed.insert(position);
        log::trace!("anchor {anchor} placed for position {position}");
        Ok(anchor)
    }

    /// Last top-level node of the nearest live position before `position`.
    fn preceding_tail(&self, record: &Layer, position: PositionId) -> Option<NodeId> {
        let end = record.state.partition_point(|&live| live < position);
        record.state[..end]
            .iter()
            .rev()
            .find_map(|&live| position_tail(&*self.applier, record, live))
    }

    pub(crate) fn region_nodes(&self, layer: LayerId) -> Result<Vec<NodeId>, RenderError> {
        region_nodes(&*self.applier, &*self.store, layer)
    }

    /// Places `elements[position]` in order right after the position's
    /// anchor, touching only nodes that are out of place.
    pub(crate) fn insert_layer_elements(
        &mut self,
        layer: LayerId,
        position: PositionId,
    ) -> Result<(), RenderError> {
        let anchor = self.ensure_anchor(layer, position)?;
        let Some(parent) = self.applier.parent(anchor) else {
            return Ok(());
        };
        let nodes = self.store.get(layer)?.nodes(position).to_vec();
        let mut previous = anchor;
        for node in nodes {
            let in_place = self.applier.parent(node) == Some(parent)
                && self.applier.previous_sibling(node) == Some(previous);
            if !in_place {
                let reference = self.applier.next_sibling(previous);
                self.applier.insert_before(parent, node, reference)?;
            }
            previous = node;
        }
        Ok(())
    }

    /// Moves `nodes` in order before `reference`.
    pub(crate) fn move_before(
        &mut self,
        nodes: &[NodeId],
        reference: NodeId,
    ) -> Result<(), RenderError> {
        let Some(parent) = self.applier.parent(reference) else {
            return Ok(());
        };
        for &node in nodes {
            self.applier.insert_before(parent, node, Some(reference))?;
        }
        Ok(())
    }

    /// Siblings from `start` up to, not including, `boundary`.
    pub(crate) fn sibling_range(&self, start: NodeId, boundary: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut node = Some(start);
        while let Some(current) = node {
            if current == boundary {
                break;
            }
            nodes.push(current);
            node = self.applier.next_sibling(current);
        }
        nodes
    }
}

/// Last node `position` owns in the layer's top-level run, if any.
fn position_tail(applier: &dyn Applier, record: &Layer, position: PositionId) -> Option<NodeId> {
    let in_region = |node: &&NodeId| applier.parent(**node) == Some(record.container);
    record
        .elements
        .get(&position)
        .and_then(|nodes| nodes.last())
        .filter(in_region)
        .or_else(|| record.anchors.get(&position).filter(in_region))
        .copied()
}

/// The layer's top-level run, in order.
pub(crate) fn region_nodes(
    applier: &dyn Applier,
    store: &LayerStore,
    layer: LayerId,
) -> Result<Vec<NodeId>, RenderError> {
    let record = store.get(layer)?;
    let Some(last) = record
        .state
        .iter()
        .rev()
        .find_map(|&live| position_tail(applier, record, live))
    else {
        return Ok(Vec::new());
    };
    let mut node = match record.origin {
        Some(origin) => applier.next_sibling(origin),
        None => applier.first_child(record.container),
    };
    let mut nodes = Vec::new();
    while let Some(current) = node {
        nodes.push(current);
        if current == last {
            break;
        }
        node = applier.next_sibling(current);
    }
    Ok(nodes)
}

/// Top-level output of the layer without anchors.
pub(crate) fn output_nodes(
    applier: &dyn Applier,
    store: &LayerStore,
    layer: LayerId,
) -> Result<Vec<NodeId>, RenderError> {
    Ok(region_nodes(applier, store, layer)?
        .into_iter()
        .filter(|&node| !matches!(applier.kind(node), Ok(NodeKind::Comment)))
        .collect())
}
