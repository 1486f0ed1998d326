//! Nested template programs.
//!
//! A component position instantiates another [`Program`] in place. The
//! instance gets its own layer, placed right after the position's anchor,
//! and its own name scope whose state is the props it was given.
//!
//! Programs are found by name in [`Imports`]. Hosts that fetch programs
//! lazily implement [`ComponentLoader`] and mount with
//! [`Renderer::mount_async`](crate::Renderer::mount_async), which resolves a
//! program's imports, and theirs, before the first pass.

use std::rc::Rc;

use futures_task::LocalFutureObj;

use crate::collections::map::HashMap;
use crate::layer::Layer;
use crate::pass::Frame;
use crate::{
    LayerId, LoadError, NodeError, Pass, PositionId, Program, RenderError, Value, ROOT_TEMPLATE,
};

pub type LoadFuture = LocalFutureObj<'static, Result<Rc<Program>, LoadError>>;

pub trait ComponentLoader {
    fn load(&self, name: &str) -> LoadFuture;
}

/// Programs available to component positions, by name.
#[derive(Clone, Default)]
pub struct Imports {
    programs: HashMap<String, Rc<Program>>,
}

impl Imports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, program: impl Into<Rc<Program>>) -> Self {
        self.insert(name, program);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, program: impl Into<Rc<Program>>) {
        self.programs.insert(name.into(), program.into());
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Program>> {
        self.programs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl std::fmt::Debug for Imports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.programs.keys()).finish()
    }
}

impl ComponentLoader for Imports {
    fn load(&self, name: &str) -> LoadFuture {
        let result = self
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::new(name, "not registered"));
        LocalFutureObj::new(Box::pin(std::future::ready(result)))
    }
}

/// Loads every program `root` transitively imports, one at a time,
/// depth-first in declaration order. Names already present in `imports` are
/// not loaded again.
pub async fn resolve_imports(
    root: &Rc<Program>,
    loader: &dyn ComponentLoader,
    imports: &mut Imports,
) -> Result<(), LoadError> {
    let mut stack: Vec<(Rc<Program>, usize)> = vec![(root.clone(), 0)];
    loop {
        let next = match stack.last_mut() {
            None => break,
            Some((program, cursor)) => {
                let name = program.imports().get(*cursor).cloned();
                *cursor += 1;
                name
            }
        };
        let Some(name) = next else {
            stack.pop();
            continue;
        };
        if imports.contains(&name) {
            continue;
        }
        log::debug!("loading component `{name}`");
        let program = loader.load(&name).await?;
        imports.insert(name, program.clone());
        stack.push((program, 0));
    }
    Ok(())
}

impl Pass<'_> {
    /// Renders the component `name` at `position` with `props` as its state.
    pub fn component(
        &mut self,
        layer: LayerId,
        position: PositionId,
        name: &str,
        props: impl Into<Value>,
    ) -> Result<(), RenderError> {
        let instance = match self.store.get(layer)?.component(position) {
            Some(instance) => instance,
            None => self.instantiate(layer, position, name)?,
        };

        self.push_frame(Frame::new(props.into(), Value::Null));
        let rendered = self.run_template(instance, ROOT_TEMPLATE);
        self.pop_frame();
        rendered?;

        let nodes = self.region_nodes(instance)?;
        self.store.get_mut(layer)?.elements.insert(position, nodes);
        Ok(())
    }

    fn instantiate(
        &mut self,
        layer: LayerId,
        position: PositionId,
        name: &str,
    ) -> Result<LayerId, RenderError> {
        let program = self
            .imports
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownComponent {
                name: name.to_owned(),
            })?;
        let anchor = self.ensure_anchor(layer, position)?;
        let container = self
            .applier
            .parent(anchor)
            .ok_or(NodeError::Missing { id: anchor })?;
        let pool = self.store.get(layer)?.pool_for(position);
        let mut record = Layer::new(program, Some(layer), container, Some(anchor), pool);
        record.scope_root = true;
        let instance = self.store.insert(record);
        self.store
            .get_mut(layer)?
            .components
            .insert(position, instance);
        log::trace!("component `{name}` instantiated at position {position} as {instance:?}");
        Ok(instance)
    }
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;
