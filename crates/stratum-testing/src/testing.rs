use std::rc::Rc;

use stratum_core::markup::{materialize, parse_fragment};
use stratum_core::{
    Applier, Imports, MemoryApplier, MutationStats, NodeData, NodeId, Program, RenderError,
    Renderer, Value,
};

/// Headless harness for exercising templates in tests.
///
/// `RenderTestRule` owns an in-memory applier with a `<main>` container and a
/// renderer bound to it. Helpers expose the rendered tree as HTML or as
/// [`Rendered`] snapshots, and the applier's mutation counters for asserting
/// what a pass touched.
pub struct RenderTestRule {
    renderer: Renderer<MemoryApplier>,
}

impl RenderTestRule {
    /// Create a rule rendering `program` into an empty container.
    pub fn new(program: impl Into<Rc<Program>>) -> Self {
        let mut applier = MemoryApplier::new();
        let container = applier.create_element("main");
        Self {
            renderer: Renderer::new(applier, container, program),
        }
    }

    /// Create a rule whose container already holds `html`, as if rendered
    /// on a server. Mutation counters start at zero.
    pub fn with_markup(program: impl Into<Rc<Program>>, html: &str) -> Result<Self, RenderError> {
        let mut applier = MemoryApplier::new();
        let container = applier.create_element("main");
        for node in materialize(&mut applier, &parse_fragment(html))? {
            applier.insert_before(container, node, None)?;
        }
        applier.reset_stats();
        Ok(Self {
            renderer: Renderer::new(applier, container, program),
        })
    }

    pub fn with_imports(mut self, imports: Imports) -> Self {
        self.renderer = self.renderer.with_imports(imports);
        self
    }

    pub fn mount(&mut self, state: impl Into<Value>) -> Result<Vec<NodeId>, RenderError> {
        self.renderer.mount(state)
    }

    pub fn render(&mut self, state: impl Into<Value>) -> Result<Vec<NodeId>, RenderError> {
        self.renderer.render(state)
    }

    pub fn render_with_scope(
        &mut self,
        scope: impl Into<Value>,
        state: impl Into<Value>,
    ) -> Result<Vec<NodeId>, RenderError> {
        self.renderer.render_with_scope(scope, state)
    }

    /// Renders twice more with `state` and returns the mutations of the last
    /// pass alone.
    pub fn rerender_stats(&mut self, state: impl Into<Value>) -> Result<MutationStats, RenderError> {
        let state = state.into();
        self.render(state.clone())?;
        self.reset_stats();
        self.render(state)?;
        Ok(self.stats())
    }

    pub fn container(&self) -> NodeId {
        self.renderer.container()
    }

    pub fn applier(&self) -> &MemoryApplier {
        self.renderer.applier()
    }

    pub fn applier_mut(&mut self) -> &mut MemoryApplier {
        self.renderer.applier_mut()
    }

    pub fn renderer(&self) -> &Renderer<MemoryApplier> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<MemoryApplier> {
        &mut self.renderer
    }

    pub fn stats(&self) -> MutationStats {
        self.applier().stats()
    }

    pub fn reset_stats(&mut self) {
        self.applier_mut().reset_stats();
    }

    /// Container content as HTML, anchors left out.
    pub fn html(&self) -> String {
        to_html(self.applier(), &self.applier().children(self.container()))
    }

    /// Container content as snapshots, anchors left out.
    pub fn snapshot(&self) -> Vec<Rendered> {
        snapshot(self.applier(), &self.applier().children(self.container()))
    }

    pub fn dump(&self) -> String {
        self.applier().dump_tree(Some(self.container()))
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RenderTestRule`.
pub fn run_test_render<R>(
    program: impl Into<Rc<Program>>,
    f: impl FnOnce(&mut RenderTestRule) -> R,
) -> R {
    let mut rule = RenderTestRule::new(program);
    f(&mut rule)
}

/// Owned view of a rendered node, comparable in assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        properties: Vec<(String, bool)>,
        children: Vec<Rendered>,
    },
    Text(String),
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Rendered::Text(text.into())
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Rendered::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Rendered::Element { attributes, .. } = &mut self {
            attributes.push((name.into(), value.into()));
        }
        self
    }

    pub fn child(mut self, child: Rendered) -> Self {
        if let Rendered::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}

/// Snapshots of `nodes`, skipping comments.
pub fn snapshot(applier: &MemoryApplier, nodes: &[NodeId]) -> Vec<Rendered> {
    nodes
        .iter()
        .filter_map(|&node| match applier.data(node).ok()? {
            NodeData::Text(text) => Some(Rendered::Text(text.clone())),
            NodeData::Comment(_) => None,
            NodeData::Element {
                tag,
                attributes,
                properties,
            } => Some(Rendered::Element {
                tag: tag.clone(),
                attributes: attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
                properties: properties
                    .iter()
                    .map(|(name, value)| (name.clone(), *value))
                    .collect(),
                children: snapshot(applier, &applier.children(node)),
            }),
        })
        .collect()
}

/// Serializes `nodes` as HTML, skipping comments. Boolean properties that
/// are set render as bare attributes.
pub fn to_html(applier: &MemoryApplier, nodes: &[NodeId]) -> String {
    let mut out = String::new();
    for &node in nodes {
        write_html(applier, node, &mut out);
    }
    out
}

fn write_html(applier: &MemoryApplier, node: NodeId, out: &mut String) {
    let Ok(data) = applier.data(node) else {
        return;
    };
    match data {
        NodeData::Text(text) => out.push_str(&escape(text, false)),
        NodeData::Comment(_) => {}
        NodeData::Element {
            tag,
            attributes,
            properties,
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push_str(&format!(" {name}=\"{}\"", escape(value, true)));
            }
            for (name, _) in properties.iter().filter(|(_, set)| **set) {
                out.push(' ');
                out.push_str(name);
            }
            out.push('>');
            for child in applier.children(node) {
                write_html(applier, child, out);
            }
            if !is_void(tag) {
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

/// Installs `env_logger` for the test binary; repeated calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
