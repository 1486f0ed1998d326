#![doc = r"Incremental reconciliation runtime for compiled HTML templates."]

pub mod applier;
pub mod assembler;
pub mod attributes;
pub mod collections;
pub mod component;
pub mod instruction;
pub mod layer;
pub mod lookahead;
pub mod markup;
pub mod pass;
pub mod renderer;
pub mod value;

mod array;
mod cleanup;
mod dispatcher;
mod placement;
mod text;

pub use applier::{Applier, MemoryApplier, MutationStats, NodeData, NodeKind};
pub use assembler::{Child, ElementSpec};
pub use attributes::{is_boolean_attribute, BOOLEAN_ATTRIBUTES};
pub use component::{ComponentLoader, Imports, LoadFuture};
pub use instruction::{DynamicNodes, Instruction, InstructionKind, Program, ProgramBuilder};
pub use layer::{AttrKey, LayerId};
pub use pass::{Binding, Pass};
pub use renderer::Renderer;
pub use value::{Fields, Value};

use std::fmt;

pub type NodeId = usize;
/// Compiler-assigned id of a dynamic position within a template.
pub type PositionId = u32;
/// Id of a template function; `0` is the root, a loop at position `p` runs
/// template `p + 1` per item.
pub type TemplateId = u32;

pub const ROOT_TEMPLATE: TemplateId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    TypeMismatch { id: NodeId, expected: &'static str },
    NotAChild { parent: NodeId, child: NodeId },
    Cycle { parent: NodeId, child: NodeId },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::TypeMismatch { id, expected } => {
                write!(f, "node {id} type mismatch; expected {expected}")
            }
            NodeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
            NodeError::Cycle { parent, child } => {
                write!(f, "cannot insert node {child} into its descendant {parent}")
            }
        }
    }
}

impl std::error::Error for NodeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub name: String,
    pub reason: String,
}

impl LoadError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load component `{}`: {}", self.name, self.reason)
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Node(NodeError),
    MissingLayer(LayerId),
    UnknownComponent { name: String },
    Load(LoadError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Node(err) => write!(f, "output tree: {err}"),
            RenderError::MissingLayer(id) => write!(f, "layer {id:?} missing"),
            RenderError::UnknownComponent { name } => {
                write!(f, "component `{name}` is not imported")
            }
            RenderError::Load(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Node(err) => Some(err),
            RenderError::Load(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NodeError> for RenderError {
    fn from(err: NodeError) -> Self {
        RenderError::Node(err)
    }
}

impl From<LoadError> for RenderError {
    fn from(err: LoadError) -> Self {
        RenderError::Load(err)
    }
}
