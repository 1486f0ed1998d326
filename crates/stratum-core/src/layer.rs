//! Per-scope render bookkeeping.
//!
//! A [`Layer`] records what one instantiation of a template produced during
//! the previous pass: which positions were live, the nodes and anchor of each,
//! lookahead pools handed to them, attribute caches, text caches, nested loop
//! children and component instances. The root template owns one layer; every
//! loop iteration and every component instance owns a child layer.
//!
//! Layers live in a [`LayerStore`] arena and refer to each other by
//! [`LayerId`]. Ids carry a generation so a handle to a destroyed layer never
//! resolves to the layer that later reuses its slot.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::collections::map::{HashMap, HashSet};
use crate::lookahead::PoolId;
use crate::{NodeId, PositionId, Program, RenderError, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId {
    index: u32,
    generation: u32,
}

/// Identifies a keyed element: the `index`-th element registered by the create
/// instruction at `position`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttrKey {
    pub position: PositionId,
    pub index: u32,
}

impl AttrKey {
    pub const fn new(position: PositionId, index: u32) -> Self {
        Self { position, index }
    }
}

/// The attributes position that last wrote an attribute name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Writer {
    pub layer: LayerId,
    pub position: PositionId,
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeSlot {
    pub element: NodeId,
    /// Every attribute name touched on `element`, with its last writer.
    pub cache: IndexMap<String, Writer>,
}

impl AttributeSlot {
    pub fn new(element: NodeId) -> Self {
        Self {
            element,
            cache: IndexMap::new(),
        }
    }
}

/// Loop items of one array position and the layers rendering them, in output
/// order.
#[derive(Debug, Default, Clone)]
pub(crate) struct Children {
    pub items: Vec<Value>,
    pub layers: Vec<LayerId>,
}

pub struct Layer {
    pub(crate) program: Rc<Program>,
    pub(crate) parent: Option<LayerId>,
    /// Root of a program instance (the renderer root or a component).
    pub(crate) scope_root: bool,
    /// Node holding this layer's top-level output.
    pub(crate) container: NodeId,
    /// Node right before this layer's top-level output; `None` means the
    /// start of `container`.
    pub(crate) origin: Option<NodeId>,
    pub(crate) cursor: usize,
    /// Positions live in the previous pass, ascending.
    pub(crate) state: Vec<PositionId>,
    pub(crate) elements: HashMap<PositionId, Vec<NodeId>>,
    pub(crate) lookahead: HashMap<PositionId, PoolId>,
    pub(crate) default_pool: PoolId,
    pub(crate) anchors: HashMap<PositionId, NodeId>,
    /// Positions whose anchor was placed at render time rather than built
    /// into static content.
    pub(crate) placed: HashSet<PositionId>,
    pub(crate) children: HashMap<PositionId, Children>,
    pub(crate) attributes: HashMap<AttrKey, AttributeSlot>,
    /// Slot each attributes position wrote to, as `(owning layer, key)`.
    pub(crate) attribute_targets: HashMap<PositionId, (LayerId, AttrKey)>,
    pub(crate) components: HashMap<PositionId, LayerId>,
    pub(crate) text_cache: HashMap<PositionId, String>,
}

impl Layer {
    pub(crate) fn new(
        program: Rc<Program>,
        parent: Option<LayerId>,
        container: NodeId,
        origin: Option<NodeId>,
        default_pool: PoolId,
    ) -> Self {
        Self {
            program,
            parent,
            scope_root: parent.is_none(),
            container,
            origin,
            cursor: 0,
            state: Vec::new(),
            elements: HashMap::default(),
            lookahead: HashMap::default(),
            default_pool,
            anchors: HashMap::default(),
            placed: HashSet::default(),
            children: HashMap::default(),
            attributes: HashMap::default(),
            attribute_targets: HashMap::default(),
            components: HashMap::default(),
            text_cache: HashMap::default(),
        }
    }

    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    /// Positions that were live in the last completed pass.
    pub fn live_positions(&self) -> &[PositionId] {
        &self.state
    }

    pub fn anchor(&self, position: PositionId) -> Option<NodeId> {
        self.anchors.get(&position).copied()
    }

    pub fn nodes(&self, position: PositionId) -> &[NodeId] {
        self.elements
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn cached_text(&self, position: PositionId) -> Option<&str> {
        self.text_cache.get(&position).map(String::as_str)
    }

    /// Layers rendering the items of the loop at `position`, in output order.
    pub fn child_layers(&self, position: PositionId) -> &[LayerId] {
        self.children
            .get(&position)
            .map(|children| children.layers.as_slice())
            .unwrap_or(&[])
    }

    pub fn component(&self, position: PositionId) -> Option<LayerId> {
        self.components.get(&position).copied()
    }

    pub(crate) fn pool_for(&self, position: PositionId) -> PoolId {
        self.lookahead
            .get(&position)
            .copied()
            .unwrap_or(self.default_pool)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("program", &self.program.name())
            .field("parent", &self.parent)
            .field("container", &self.container)
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("anchors", &self.anchors.len())
            .field("children", &self.children.len())
            .finish()
    }
}

struct Slot {
    generation: u32,
    layer: Option<Layer>,
}

#[derive(Default)]
pub struct LayerStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, layer: Layer) -> LayerId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.layer = Some(layer);
            return LayerId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            layer: Some(layer),
        });
        LayerId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: LayerId) -> Result<&Layer, RenderError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.layer.as_ref())
            .ok_or(RenderError::MissingLayer(id))
    }

    pub(crate) fn get_mut(&mut self, id: LayerId) -> Result<&mut Layer, RenderError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.layer.as_mut())
            .ok_or(RenderError::MissingLayer(id))
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_ok()
    }

    pub(crate) fn release(&mut self, id: LayerId) -> Option<Layer> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let layer = slot.layer.take()?;
        self.free.push(id.index);
        Some(layer)
    }

    /// Number of live layers.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "tests/layer_tests.rs"]
mod tests;
