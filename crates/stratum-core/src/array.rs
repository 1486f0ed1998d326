//! Loop reconciliation keyed by item identity.
//!
//! Each loop item is rendered by its own child layer. Between passes, an item
//! keeps its layer (and therefore its nodes) as long as the same item, in the
//! sense of [`Value::same`], is still in the list; reordering moves node
//! ranges instead of rebuilding them. An object mutated in place stays the
//! same item and only has its body re-run.

use crate::layer::{Children, Layer};
use crate::pass::Binding;
use crate::{LayerId, NodeError, NodeId, Pass, PositionId, RenderError, Value};

impl Pass<'_> {
    /// Reconciles the loop at `position` against `entries`, rendering each
    /// item with template `position + 1`.
    ///
    /// Entries are `(key, item)` pairs, typically [`Value::entries`]. Items
    /// are matched to last pass's layers by identity, first unclaimed match
    /// wins, so duplicates pair up in order.
    pub fn for_each(
        &mut self,
        layer: LayerId,
        position: PositionId,
        binding: &Binding,
        entries: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<(), RenderError> {
        let anchor = self.ensure_anchor(layer, position)?;
        let body = position + 1;
        let mut children = self
            .store
            .get_mut(layer)?
            .children
            .remove(&position)
            .unwrap_or_default();
        let result = self.reconcile(layer, position, anchor, binding, entries, &mut children);
        self.store
            .get_mut(layer)?
            .children
            .insert(position, children);
        log::trace!("loop {position} in {layer:?} reconciled (body template {body})");
        result
    }

    fn reconcile(
        &mut self,
        layer: LayerId,
        position: PositionId,
        anchor: NodeId,
        binding: &Binding,
        entries: impl IntoIterator<Item = (Value, Value)>,
        children: &mut Children,
    ) -> Result<(), RenderError> {
        let body = position + 1;
        let mut index = 0;
        for (key, item) in entries {
            let claimed = children.items[index..]
                .iter()
                .position(|existing| existing.same(&item))
                .map(|offset| index + offset);
            let child = match claimed {
                None => {
                    let reference = match children.layers.get(index) {
                        Some(&next) => self.origin_of(next)?,
                        None => anchor,
                    };
                    let child = self.create_item_layer(layer, position, reference)?;
                    children.items.insert(index, item.clone());
                    children.layers.insert(index, child);
                    child
                }
                Some(found) if found != index => {
                    let moved = children.layers[found];
                    let boundary = match children.layers.get(found + 1) {
                        Some(&next) => self.origin_of(next)?,
                        None => anchor,
                    };
                    let range = self.sibling_range(self.origin_of(moved)?, boundary);
                    let reference = self.origin_of(children.layers[index])?;
                    log::trace!(
                        "loop {position}: item {found} moves to {index} ({} nodes)",
                        range.len()
                    );
                    self.move_before(&range, reference)?;
                    let claimed_item = children.items.remove(found);
                    children.items.insert(index, claimed_item);
                    children.layers.remove(found);
                    children.layers.insert(index, moved);
                    moved
                }
                Some(_) => children.layers[index],
            };

            let mut locals = vec![(binding.item.clone(), item)];
            if let Some(name) = &binding.key {
                locals.push((name.clone(), key));
            }
            let mark = self.bind(locals);
            let rendered = self.run_template(child, body);
            self.unbind(mark);
            rendered?;
            index += 1;
        }

        while children.layers.len() > index {
            if let Some(stale) = children.layers.pop() {
                children.items.pop();
                self.remove_layer(stale)?;
            }
        }
        Ok(())
    }

    fn create_item_layer(
        &mut self,
        layer: LayerId,
        position: PositionId,
        reference: NodeId,
    ) -> Result<LayerId, RenderError> {
        let body = position + 1;
        let (program, pool) = {
            let record = self.store.get(layer)?;
            (record.program.clone(), record.pool_for(position))
        };
        let container = self
            .applier
            .parent(reference)
            .ok_or(NodeError::Missing { id: reference })?;
        let origin = self.applier.create_comment(&body.to_string());
        self.applier.insert_before(container, origin, Some(reference))?;

        let mut record = Layer::new(program, Some(layer), container, Some(origin), pool);
        record.anchors.insert(body, origin);
        record.lookahead.insert(body, pool);
        Ok(self.store.insert(record))
    }

    pub(crate) fn origin_of(&self, layer: LayerId) -> Result<NodeId, RenderError> {
        let record = self.store.get(layer)?;
        record
            .origin
            .ok_or(RenderError::MissingLayer(layer))
    }
}

#[cfg(test)]
#[path = "tests/array_tests.rs"]
mod tests;
