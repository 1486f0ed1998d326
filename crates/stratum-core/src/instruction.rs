//! Compiled template programs.
//!
//! A [`Program`] is what the template compiler emits for one template: one
//! instruction per dynamic position and one template function per scope (the
//! root plus the body of every loop). Template functions call
//! [`Pass::handle`] for each position they reach, in ascending order;
//! instructions do the position's work through the [`Pass`] helpers.

use std::fmt;

use crate::collections::map::HashMap;
use crate::{Child, LayerId, Pass, PositionId, RenderError, TemplateId};

pub type InstructionFn = Box<dyn Fn(&mut Pass<'_>, LayerId, PositionId) -> Result<(), RenderError>>;
pub type TemplateFn = Box<dyn Fn(&mut Pass<'_>, LayerId) -> Result<(), RenderError>>;

/// Decides how a position is torn down once it stops being reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Create,
    Attributes,
    Text,
    Array,
    Execute,
    Component,
}

pub enum Instruction {
    /// Static subtree; runs once, when the position is created.
    Create(Vec<Child>),
    Attributes(InstructionFn),
    Text(InstructionFn),
    Array(InstructionFn),
    Execute(InstructionFn),
    Component(InstructionFn),
}

impl Instruction {
    pub fn kind(&self) -> InstructionKind {
        match self {
            Instruction::Create(_) => InstructionKind::Create,
            Instruction::Attributes(_) => InstructionKind::Attributes,
            Instruction::Text(_) => InstructionKind::Text,
            Instruction::Array(_) => InstructionKind::Array,
            Instruction::Execute(_) => InstructionKind::Execute,
            Instruction::Component(_) => InstructionKind::Component,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Create(children) => f.debug_tuple("Create").field(children).finish(),
            other => write!(f, "{:?}(..)", other.kind()),
        }
    }
}

/// Position id to instruction kind. Immutable once the program is built.
#[derive(Debug, Default, Clone)]
pub struct DynamicNodes {
    kinds: HashMap<PositionId, InstructionKind>,
}

impl DynamicNodes {
    pub fn kind(&self, position: PositionId) -> Option<InstructionKind> {
        self.kinds.get(&position).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

pub struct Program {
    name: String,
    instructions: HashMap<PositionId, Instruction>,
    templates: HashMap<TemplateId, TemplateFn>,
    dynamic_nodes: DynamicNodes,
    imports: Vec<String>,
}

impl Program {
    pub fn builder(name: impl Into<String>) -> ProgramBuilder {
        ProgramBuilder {
            program: Program {
                name: name.into(),
                instructions: HashMap::default(),
                templates: HashMap::default(),
                dynamic_nodes: DynamicNodes::default(),
                imports: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruction(&self, position: PositionId) -> Option<&Instruction> {
        self.instructions.get(&position)
    }

    pub fn template(&self, id: TemplateId) -> Option<&TemplateFn> {
        self.templates.get(&id)
    }

    pub fn dynamic_nodes(&self) -> &DynamicNodes {
        &self.dynamic_nodes
    }

    pub fn kind(&self, position: PositionId) -> Option<InstructionKind> {
        self.dynamic_nodes.kind(position)
    }

    /// Component names this program instantiates, in declaration order.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("name", &self.name)
            .field("positions", &self.instructions.len())
            .field("templates", &self.templates.len())
            .field("imports", &self.imports)
            .finish()
    }
}

pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn template(
        mut self,
        id: TemplateId,
        template: impl Fn(&mut Pass<'_>, LayerId) -> Result<(), RenderError> + 'static,
    ) -> Self {
        if self.program.templates.insert(id, Box::new(template)).is_some() {
            log::warn!("{}: template {id} registered twice", self.program.name);
        }
        self
    }

    pub fn instruction(mut self, position: PositionId, instruction: Instruction) -> Self {
        let kind = instruction.kind();
        if self
            .program
            .instructions
            .insert(position, instruction)
            .is_some()
        {
            log::warn!("{}: position {position} registered twice", self.program.name);
        }
        self.program.dynamic_nodes.kinds.insert(position, kind);
        self
    }

    pub fn create<C: Into<Child>>(
        self,
        position: PositionId,
        children: impl IntoIterator<Item = C>,
    ) -> Self {
        self.instruction(
            position,
            Instruction::Create(children.into_iter().map(Into::into).collect()),
        )
    }

    pub fn attributes(
        self,
        position: PositionId,
        run: impl Fn(&mut Pass<'_>, LayerId, PositionId) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.instruction(position, Instruction::Attributes(Box::new(run)))
    }

    pub fn text(
        self,
        position: PositionId,
        run: impl Fn(&mut Pass<'_>, LayerId, PositionId) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.instruction(position, Instruction::Text(Box::new(run)))
    }

    pub fn array(
        self,
        position: PositionId,
        run: impl Fn(&mut Pass<'_>, LayerId, PositionId) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.instruction(position, Instruction::Array(Box::new(run)))
    }

    pub fn execute(
        self,
        position: PositionId,
        run: impl Fn(&mut Pass<'_>, LayerId, PositionId) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.instruction(position, Instruction::Execute(Box::new(run)))
    }

    pub fn component(
        self,
        position: PositionId,
        run: impl Fn(&mut Pass<'_>, LayerId, PositionId) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.instruction(position, Instruction::Component(Box::new(run)))
    }

    pub fn import(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.program.imports.contains(&name) {
            self.program.imports.push(name);
        }
        self
    }

    pub fn build(self) -> Program {
        self.program
    }
}
