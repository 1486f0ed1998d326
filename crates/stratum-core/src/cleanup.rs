use crate::layer::Writer;
use crate::{attributes, InstructionKind, LayerId, NodeError, NodeId, Pass, PositionId, RenderError};

impl Pass<'_> {
    /// Tears down what `position` produced in `layer`, according to its
    /// instruction kind. The position's anchor stays in place.
    pub(crate) fn remove(&mut self, layer: LayerId, position: PositionId) -> Result<(), RenderError> {
        let kind = {
            let record = self.store.get(layer)?;
            let kind = record.program.kind(position);
            if kind.is_none() {
                log::warn!(
                    "{}: removing unregistered position {position}",
                    record.program.name()
                );
            }
            kind
        };
        match kind {
            Some(InstructionKind::Array) => {
                let children = self.store.get_mut(layer)?.children.remove(&position);
                for child in children.into_iter().flat_map(|children| children.layers) {
                    self.remove_layer(child)?;
                }
                Ok(())
            }
            Some(InstructionKind::Execute) => Ok(()),
            Some(InstructionKind::Attributes) => self.release_attributes(layer, position),
            Some(InstructionKind::Text) => {
                self.store.get_mut(layer)?.text_cache.remove(&position);
                self.remove_elements(layer, position)
            }
            Some(InstructionKind::Component) => {
                if let Some(instance) = self.store.get_mut(layer)?.components.remove(&position) {
                    self.remove_layer(instance)?;
                }
                self.remove_elements(layer, position)
            }
            Some(InstructionKind::Create) | None => self.remove_elements(layer, position),
        }
    }

    /// Removes a position that stopped being reached. Anchors placed at render
    /// time go with it, so a later reappearance is placed afresh.
    pub(crate) fn retire(&mut self, layer: LayerId, position: PositionId) -> Result<(), RenderError> {
        self.remove(layer, position)?;
        let record = self.store.get_mut(layer)?;
        if !record.placed.remove(&position) {
            return Ok(());
        }
        match record.anchors.remove(&position) {
            Some(anchor) => self.discard(anchor),
            None => Ok(()),
        }
    }

    fn remove_elements(&mut self, layer: LayerId, position: PositionId) -> Result<(), RenderError> {
        let nodes = self
            .store
            .get_mut(layer)?
            .elements
            .remove(&position)
            .unwrap_or_default();
        for node in nodes {
            self.discard(node)?;
        }
        Ok(())
    }

    fn release_attributes(&mut self, layer: LayerId, position: PositionId) -> Result<(), RenderError> {
        let Some((owner, key)) = self
            .store
            .get_mut(layer)?
            .attribute_targets
            .remove(&position)
        else {
            return Ok(());
        };
        // the element may have gone with its layer already
        let Ok(record) = self.store.get_mut(owner) else {
            return Ok(());
        };
        if let Some(slot) = record.attributes.get_mut(&key) {
            attributes::release(&mut *self.applier, slot, Writer { layer, position })?;
        }
        Ok(())
    }

    /// Destroys a child layer: all of its positions, its anchors, and the
    /// layers nested under it.
    pub(crate) fn remove_layer(&mut self, layer: LayerId) -> Result<(), RenderError> {
        let positions = self.store.get(layer)?.state.clone();
        for &position in positions.iter().rev() {
            self.remove(layer, position)?;
        }
        if let Some(record) = self.store.release(layer) {
            for anchor in record.anchors.into_values() {
                self.discard(anchor)?;
            }
        }
        log::trace!("layer {layer:?} destroyed");
        Ok(())
    }

    /// Removes a node from the tree; nodes already released along with an
    /// ancestor are skipped.
    fn discard(&mut self, node: NodeId) -> Result<(), RenderError> {
        match self.applier.remove(node) {
            Ok(()) | Err(NodeError::Missing { .. }) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
#[path = "tests/cleanup_tests.rs"]
mod tests;
