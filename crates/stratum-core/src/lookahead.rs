//! Lookahead pools for hydration.
//!
//! When a renderer mounts into a container that already holds markup, the
//! existing nodes are offered for reuse through pools. Each pool is an ordered
//! list of candidate nodes; positions that share a pool share it by handle, so
//! a node claimed by one of them is gone for all. Pools only exist during the
//! first pass; afterwards every unclaimed node is removed from the tree.

use crate::{Applier, NodeId, NodeKind, RenderError};

/// Handle to a pool in [`Pools`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolId(usize);

impl PoolId {
    /// The pool that never holds anything.
    pub const EMPTY: PoolId = PoolId(0);
}

/// What the assembler is looking for.
#[derive(Clone, Copy, Debug)]
pub enum Want<'a> {
    Text,
    Element(&'a str),
}

pub struct Pools {
    pools: Vec<Vec<NodeId>>,
    hydrating: bool,
}

impl Default for Pools {
    fn default() -> Self {
        Self {
            pools: vec![Vec::new()],
            hydrating: true,
        }
    }
}

impl Pools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hydrating(&self) -> bool {
        self.hydrating
    }

    /// Registers `nodes` as a new pool. Once hydration is over, or when there
    /// is nothing to offer, the shared empty pool is returned instead.
    pub fn alloc(&mut self, nodes: Vec<NodeId>) -> PoolId {
        if !self.hydrating || nodes.is_empty() {
            return PoolId::EMPTY;
        }
        self.pools.push(nodes);
        PoolId(self.pools.len() - 1)
    }

    pub fn get(&self, id: PoolId) -> &[NodeId] {
        self.pools.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Removes and returns the first node in pool `id` matching `want`.
    ///
    /// Entries that are neither elements nor text are dropped from the pool
    /// while scanning; they stay in the tree until pruning.
    pub fn take_match(
        &mut self,
        applier: &dyn Applier,
        id: PoolId,
        want: Want<'_>,
    ) -> Option<NodeId> {
        let pool = self.pools.get_mut(id.0)?;
        let mut index = 0;
        while index < pool.len() {
            let node = pool[index];
            let kind = match applier.kind(node) {
                Ok(kind @ (NodeKind::Element | NodeKind::Text)) => kind,
                _ => {
                    pool.remove(index);
                    continue;
                }
            };
            let matched = match want {
                Want::Text => kind == NodeKind::Text,
                Want::Element(tag) => {
                    kind == NodeKind::Element
                        && applier
                            .tag_name(node)
                            .is_ok_and(|name| name.eq_ignore_ascii_case(tag))
                }
            };
            if matched {
                return Some(pool.remove(index));
            }
            index += 1;
        }
        None
    }

    /// Ends hydration: every node still sitting in a pool is removed from the
    /// tree and pools stop being allocated.
    pub fn prune(&mut self, applier: &mut dyn Applier) -> Result<usize, RenderError> {
        let mut pruned = 0;
        for pool in self.pools.drain(1..) {
            for node in pool {
                if !applier.contains(node) {
                    continue;
                }
                applier.remove(node)?;
                pruned += 1;
            }
        }
        self.hydrating = false;
        if pruned > 0 {
            log::debug!("pruned {pruned} unclaimed lookahead nodes");
        }
        Ok(pruned)
    }
}
