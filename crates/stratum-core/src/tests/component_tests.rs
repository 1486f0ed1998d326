use std::cell::RefCell;

use super::*;
use crate::{Applier, AttrKey, Child, MemoryApplier, Renderer};

const SLOT: AttrKey = AttrKey::new(1, 0);

fn card() -> Program {
    Program::builder("card")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            cx.handle(layer, 2)
        })
        .create(1, [Child::element("article").child(Child::anchor(2))])
        .text(2, |cx, layer, p| {
            let title = cx.value("title");
            let headline = cx.value("headline");
            cx.text(layer, p, format!("{title}{headline}"))
        })
        .build()
}

fn page() -> Program {
    Program::builder("page")
        .import("card")
        .template(0, |cx, layer| {
            if cx.value("show").is_truthy() {
                cx.handle(layer, 1)?;
            }
            cx.handle(layer, 2)
        })
        .component(1, |cx, layer, p| {
            let props = Value::object([("title", cx.value("headline"))]);
            cx.component(layer, p, "card", props)
        })
        .create(2, [Child::element("footer")])
        .build()
}

fn renderer(program: Program, imports: Imports) -> Renderer<MemoryApplier> {
    let mut applier = MemoryApplier::new();
    let container = applier.create_element("main");
    Renderer::new(applier, container, program).with_imports(imports)
}

fn state(show: bool, headline: &str) -> Value {
    Value::object([("show", Value::from(show)), ("headline", Value::from(headline))])
}

#[test]
fn instances_render_props_and_update_in_place() {
    let mut renderer = renderer(page(), Imports::new().with("card", card()));
    let nodes = renderer.mount(state(true, "first")).expect("mount");
    assert_eq!(nodes.len(), 2);
    let applier = renderer.applier();
    assert_eq!(applier.tag_name(nodes[0]), Ok("article"));
    assert_eq!(applier.tag_name(nodes[1]), Ok("footer"));
    // the parent's `headline` is not visible inside the card
    assert_eq!(applier.text_content(nodes[0]), "first");

    let updated = renderer.render(state(true, "second")).expect("render");
    assert_eq!(updated, nodes);
    assert_eq!(renderer.applier().text_content(nodes[0]), "second");
}

#[test]
fn stale_instances_are_destroyed() {
    let mut renderer = renderer(page(), Imports::new().with("card", card()));
    let nodes = renderer.mount(state(true, "x")).expect("mount");
    assert_eq!(renderer.layers().len(), 2);

    let after = renderer.render(state(false, "x")).expect("render");
    assert_eq!(after, vec![nodes[1]]);
    assert_eq!(renderer.layers().len(), 1);
    assert!(!renderer.applier().contains(nodes[0]));

    let again = renderer.render(state(true, "y")).expect("render");
    assert_eq!(again.len(), 2);
    assert_eq!(again[1], nodes[1]);
    assert_eq!(renderer.applier().text_content(again[0]), "y");
}

#[test]
fn unknown_components_fail_the_pass() {
    let mut renderer = renderer(page(), Imports::new());
    assert_eq!(
        renderer.mount(state(true, "x")),
        Err(RenderError::UnknownComponent {
            name: "card".into()
        })
    );
}

#[test]
fn attribute_keys_do_not_cross_instances() {
    let badge = Program::builder("badge")
        .template(0, |cx, layer| cx.handle(layer, 1))
        .attributes(1, |cx, layer, p| {
            cx.attributes(layer, p, SLOT, [("class", "hijacked")])
        })
        .build();
    let host = Program::builder("host")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            cx.handle(layer, 2)
        })
        .create(1, [Child::element("div").keyed(SLOT)])
        .component(2, |cx, layer, p| cx.component(layer, p, "badge", Value::Null))
        .build();
    let mut renderer = renderer(host, Imports::new().with("badge", badge));
    let nodes = renderer.mount(Value::Null).expect("mount");
    assert_eq!(renderer.applier().attribute(nodes[0], "class"), None);
}

struct OrderedLoader {
    programs: Imports,
    requests: RefCell<Vec<String>>,
}

impl ComponentLoader for OrderedLoader {
    fn load(&self, name: &str) -> LoadFuture {
        self.requests.borrow_mut().push(name.to_owned());
        self.programs.load(name)
    }
}

#[test]
fn imports_resolve_depth_first_once_each() {
    let leaf = |name: &str| Program::builder(name).build();
    let loader = OrderedLoader {
        programs: Imports::new()
            .with("a", Program::builder("a").import("c").build())
            .with("b", leaf("b"))
            .with("c", Program::builder("c").import("a").import("d").build())
            .with("d", leaf("d")),
        requests: RefCell::default(),
    };
    let root = Rc::new(Program::builder("root").import("a").import("b").build());
    let mut imports = Imports::new().with("d", leaf("preloaded d"));

    pollster::block_on(resolve_imports(&root, &loader, &mut imports)).expect("resolve");
    assert_eq!(*loader.requests.borrow(), ["a", "c", "b"]);
    assert_eq!(imports.len(), 4);
    assert_eq!(imports.get("d").map(|program| program.name()), Some("preloaded d"));
}

#[test]
fn load_failures_stop_resolution() {
    let loader = OrderedLoader {
        programs: Imports::new(),
        requests: RefCell::default(),
    };
    let root = Rc::new(Program::builder("root").import("missing").import("other").build());
    let mut imports = Imports::new();
    let result = pollster::block_on(resolve_imports(&root, &loader, &mut imports));
    assert_eq!(result, Err(LoadError::new("missing", "not registered")));
    assert_eq!(*loader.requests.borrow(), ["missing"]);
    assert!(imports.is_empty());
}
