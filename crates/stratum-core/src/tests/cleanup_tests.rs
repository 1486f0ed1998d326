use super::*;
use crate::{Applier, AttrKey, Binding, Child, MemoryApplier, Program, Renderer, Value};

const PANEL: AttrKey = AttrKey::new(1, 0);

fn renderer(program: Program) -> Renderer<MemoryApplier> {
    let mut applier = MemoryApplier::new();
    let container = applier.create_element("main");
    Renderer::new(applier, container, program)
}

#[test]
fn stale_attributes_release_only_their_own_names() {
    let program = Program::builder("panel")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            if cx.value("extra").is_truthy() {
                cx.handle(layer, 2)?;
            }
            cx.handle(layer, 3)
        })
        .create(1, [Child::element("div").keyed(PANEL)])
        .attributes(2, |cx, layer, p| {
            cx.attributes(
                layer,
                p,
                PANEL,
                [("data-extra", Value::from("1")), ("hidden", Value::from(true))],
            )
        })
        .attributes(3, |cx, layer, p| {
            let label = cx.value("label");
            cx.attributes(layer, p, PANEL, [("aria-label", label)])
        })
        .build();
    let mut renderer = renderer(program);
    let state = |extra: bool| {
        Value::object([("extra", Value::from(extra)), ("label", Value::from("menu"))])
    };

    let nodes = renderer.mount(state(true)).expect("mount");
    let panel = nodes[0];
    assert_eq!(renderer.applier().attribute(panel, "data-extra"), Some("1"));
    assert_eq!(renderer.applier().property(panel, "hidden"), Some(true));

    renderer.render(state(false)).expect("render");
    assert_eq!(renderer.applier().attribute(panel, "data-extra"), None);
    assert_eq!(renderer.applier().property(panel, "hidden"), None);
    assert_eq!(renderer.applier().attribute(panel, "aria-label"), Some("menu"));
}

#[test]
fn markup_text_is_removed_as_a_whole() {
    let program = Program::builder("rich")
        .template(0, |cx, layer| cx.handle(layer, 1))
        .text(1, |cx, layer, p| {
            let body = cx.value("body");
            cx.text(layer, p, body)
        })
        .build();
    let mut renderer = renderer(program);
    let container = renderer.container();

    let rich = renderer
        .mount(Value::object([("body", "<b>bold</b> &amp; plain")]))
        .expect("mount");
    assert_eq!(rich.len(), 2);
    assert_eq!(renderer.applier().tag_name(rich[0]), Ok("b"));
    assert_eq!(renderer.applier().text_content(container), "bold & plain");

    let plain = renderer
        .render(Value::object([("body", "plain")]))
        .expect("render");
    assert_eq!(plain.len(), 1);
    assert!(!renderer.applier().contains(rich[0]));
    assert!(!renderer.applier().contains(rich[1]));
    assert_eq!(renderer.applier().text_content(container), "plain");
}

#[test]
fn nested_loops_are_torn_down_recursively() {
    let program = Program::builder("grid")
        .template(0, |cx, layer| cx.handle(layer, 1))
        .array(1, |cx, layer, p| {
            let rows = cx.value("rows");
            cx.for_each(layer, p, &Binding::item("row"), rows.entries())
        })
        .template(2, |cx, layer| {
            cx.handle(layer, 2)?;
            cx.handle(layer, 3)
        })
        .create(2, [Child::element("section").child(Child::anchor(3))])
        .array(3, |cx, layer, p| {
            let row = cx.value("row");
            cx.for_each(layer, p, &Binding::item("cell"), row.entries())
        })
        .template(4, |cx, layer| cx.handle(layer, 4))
        .text(4, |cx, layer, p| {
            let cell = cx.value("cell");
            cx.text(layer, p, cell)
        })
        .build();
    let mut renderer = renderer(program);
    let container = renderer.container();
    let rows = |rows: Value| Value::object([("rows", rows)]);

    let sections = renderer
        .mount(rows(Value::array([
            Value::array(["a", "b"]),
            Value::array(["c"]),
        ])))
        .expect("mount");
    assert_eq!(sections.len(), 2);
    assert_eq!(renderer.applier().text_content(container), "abc");
    assert_eq!(renderer.layers().len(), 6);

    renderer.render(rows(Value::array(Vec::<Value>::new()))).expect("render");
    assert_eq!(renderer.layers().len(), 1);
    assert_eq!(renderer.applier().children(container).len(), 1);
    assert!(!renderer.applier().contains(sections[0]));
}
