//! The context a render pass hands to template functions and instructions.
//!
//! Name lookup goes through a stack of frames. The renderer pushes one frame
//! holding the render's `state` and `scope`; every component instance pushes
//! its own frame with its props as state, so names never leak between
//! component boundaries. Loop bodies and execute instructions add locals to
//! the current frame.

use indexmap::IndexMap;

use crate::component::Imports;
use crate::layer::{LayerStore, Writer};
use crate::lookahead::Pools;
use crate::{attributes, Applier, AttrKey, LayerId, PositionId, RenderError, Value};

pub(crate) struct Frame {
    state: Value,
    scope: Value,
    locals: Vec<(String, Value)>,
}

impl Frame {
    pub(crate) fn new(state: Value, scope: Value) -> Self {
        Self {
            state,
            scope,
            locals: Vec::new(),
        }
    }
}

/// Names a loop body binds for each item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub item: String,
    pub key: Option<String>,
}

impl Binding {
    pub fn item(name: impl Into<String>) -> Self {
        Self {
            item: name.into(),
            key: None,
        }
    }

    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.key = Some(name.into());
        self
    }
}

pub struct Pass<'a> {
    pub(crate) applier: &'a mut dyn Applier,
    pub(crate) store: &'a mut LayerStore,
    pub(crate) pools: &'a mut Pools,
    pub(crate) imports: &'a Imports,
    frames: Vec<Frame>,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(
        applier: &'a mut dyn Applier,
        store: &'a mut LayerStore,
        pools: &'a mut Pools,
        imports: &'a Imports,
        frame: Frame,
    ) -> Self {
        Self {
            applier,
            store,
            pools,
            imports,
            frames: vec![frame],
        }
    }

    /// The state of the innermost frame: the render's state, or a
    /// component's props.
    pub fn state(&self) -> Value {
        self.frames
            .last()
            .map(|frame| frame.state.clone())
            .unwrap_or_default()
    }

    pub fn scope(&self) -> Value {
        self.frames
            .last()
            .map(|frame| frame.scope.clone())
            .unwrap_or_default()
    }

    /// Looks `name` up in locals (innermost first), then state fields, then
    /// scope fields.
    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.frames.last()?;
        frame
            .locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value.clone())
            .or_else(|| frame.state.get(name))
            .or_else(|| frame.scope.get(name))
    }

    /// Owned lookup; unknown names are `Null`.
    pub fn value(&self, name: &str) -> Value {
        self.get(name).unwrap_or_default()
    }

    /// Assigns a local in the current frame, shadowing state and scope.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        match frame.locals.iter_mut().rev().find(|(local, _)| *local == name) {
            Some((_, slot)) => *slot = value,
            None => frame.locals.push((name, value)),
        }
    }

    pub fn applier(&self) -> &dyn Applier {
        &*self.applier
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Pushes locals and returns the mark to restore with
    /// [`Pass::unbind`].
    pub(crate) fn bind(&mut self, locals: impl IntoIterator<Item = (String, Value)>) -> usize {
        match self.frames.last_mut() {
            Some(frame) => {
                let mark = frame.locals.len();
                frame.locals.extend(locals);
                mark
            }
            None => 0,
        }
    }

    pub(crate) fn unbind(&mut self, mark: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.truncate(mark);
        }
    }

    /// Applies `desired` to the element registered under `key` in `layer`
    /// or its nearest ancestor that has it.
    pub fn attributes<K, V, I>(
        &mut self,
        layer: LayerId,
        position: PositionId,
        key: AttrKey,
        desired: I,
    ) -> Result<(), RenderError>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let desired: IndexMap<String, Value> = desired
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        let Some(owner) = self.attribute_owner(layer, key)? else {
            log::warn!("no element registered for attributes {key:?} at position {position}");
            return Ok(());
        };
        let writer = Writer { layer, position };
        self.store
            .get_mut(layer)?
            .attribute_targets
            .insert(position, (owner, key));
        let slot = self
            .store
            .get_mut(owner)?
            .attributes
            .get_mut(&key)
            .ok_or(RenderError::MissingLayer(owner))?;
        attributes::apply(&mut *self.applier, slot, writer, &desired)?;
        Ok(())
    }

    fn attribute_owner(
        &self,
        layer: LayerId,
        key: AttrKey,
    ) -> Result<Option<LayerId>, RenderError> {
        let mut current = layer;
        loop {
            let record = self.store.get(current)?;
            if record.attributes.contains_key(&key) {
                return Ok(Some(current));
            }
            // keys are only meaningful within one program instance
            match record.parent {
                Some(parent) if !record.scope_root => current = parent,
                _ => return Ok(None),
            }
        }
    }
}
