//! Mount and render entry points.
//!
//! A [`Renderer`] binds one [`Program`] to one container node. The first pass
//! mounts: existing children of the container are offered for reuse
//! (hydration) and whatever is left unclaimed afterwards is removed. Every
//! later pass reconciles incrementally against what the previous pass left.

use std::rc::Rc;

use crate::component::{resolve_imports, ComponentLoader, Imports};
use crate::layer::{Layer, LayerStore};
use crate::lookahead::Pools;
use crate::pass::{Frame, Pass};
use crate::placement::output_nodes;
use crate::{Applier, LayerId, NodeId, Program, RenderError, Value, ROOT_TEMPLATE};

pub struct Renderer<A: Applier> {
    applier: A,
    container: NodeId,
    program: Rc<Program>,
    imports: Imports,
    store: LayerStore,
    pools: Pools,
    root: Option<LayerId>,
    passes: u64,
}

impl<A: Applier> Renderer<A> {
    pub fn new(applier: A, container: NodeId, program: impl Into<Rc<Program>>) -> Self {
        Self {
            applier,
            container,
            program: program.into(),
            imports: Imports::new(),
            store: LayerStore::new(),
            pools: Pools::new(),
            root: None,
            passes: 0,
        }
    }

    pub fn with_imports(mut self, imports: Imports) -> Self {
        self.imports = imports;
        self
    }

    pub fn imports_mut(&mut self) -> &mut Imports {
        &mut self.imports
    }

    /// First pass, reusing the container's current children where they
    /// match.
    pub fn mount(&mut self, state: impl Into<Value>) -> Result<Vec<NodeId>, RenderError> {
        self.run(Value::Null, state.into(), None)
    }

    /// First pass, reusing nodes from `lookahead` where they match. Nodes left
    /// unclaimed are removed from the tree.
    pub fn hydrate(
        &mut self,
        state: impl Into<Value>,
        lookahead: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, RenderError> {
        if self.is_mounted() {
            log::warn!("hydrate on a mounted renderer; lookahead ignored");
        }
        self.run(Value::Null, state.into(), Some(lookahead))
    }

    /// Loads every imported component through `loader`, then mounts.
    pub async fn mount_async(
        &mut self,
        loader: &dyn ComponentLoader,
        state: impl Into<Value>,
    ) -> Result<Vec<NodeId>, RenderError> {
        resolve_imports(&self.program, loader, &mut self.imports).await?;
        self.mount(state)
    }

    pub fn render(&mut self, state: impl Into<Value>) -> Result<Vec<NodeId>, RenderError> {
        self.run(Value::Null, state.into(), None)
    }

    /// Renders with an extra `scope` consulted after `state` for name
    /// lookups.
    pub fn render_with_scope(
        &mut self,
        scope: impl Into<Value>,
        state: impl Into<Value>,
    ) -> Result<Vec<NodeId>, RenderError> {
        self.run(scope.into(), state.into(), None)
    }

    fn run(
        &mut self,
        scope: Value,
        state: Value,
        lookahead: Option<Vec<NodeId>>,
    ) -> Result<Vec<NodeId>, RenderError> {
        let mounting = self.root.is_none();
        let root = match self.root {
            Some(root) => root,
            None => {
                let seed = lookahead.unwrap_or_else(|| self.applier.children(self.container));
                let pool = self.pools.alloc(seed);
                let layer = Layer::new(self.program.clone(), None, self.container, None, pool);
                let root = self.store.insert(layer);
                self.root = Some(root);
                root
            }
        };
        self.passes += 1;
        log::debug!(
            "{}: pass {} ({})",
            self.program.name(),
            self.passes,
            if mounting { "mount" } else { "update" }
        );

        let mut pass = Pass::new(
            &mut self.applier,
            &mut self.store,
            &mut self.pools,
            &self.imports,
            Frame::new(state, scope),
        );
        let rendered = pass.run_template(root, ROOT_TEMPLATE);
        // hydration ends with the first pass, failed or not
        let pruned = if mounting {
            self.pools.prune(&mut self.applier).map(drop)
        } else {
            Ok(())
        };
        rendered.and(pruned)?;
        self.nodes()
    }

    /// Top-level output nodes in order, anchors excluded.
    pub fn nodes(&self) -> Result<Vec<NodeId>, RenderError> {
        match self.root {
            Some(root) => output_nodes(&self.applier, &self.store, root),
            None => Ok(Vec::new()),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.root.is_some()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn root_layer(&self) -> Option<LayerId> {
        self.root
    }

    pub fn layers(&self) -> &LayerStore {
        &self.store
    }

    pub fn applier(&self) -> &A {
        &self.applier
    }

    pub fn applier_mut(&mut self) -> &mut A {
        &mut self.applier
    }

    pub fn into_applier(self) -> A {
        self.applier
    }
}

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod tests;
