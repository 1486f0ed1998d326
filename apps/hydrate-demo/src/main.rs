use stratum_core::markup::{materialize, parse_fragment};
use stratum_core::{
    Applier, AttrKey, Binding, Child, MemoryApplier, Program, RenderError, Renderer, Value,
};

const STORY: AttrKey = AttrKey::new(3, 0);

const SERVER_MARKUP: &str = r#"<h1>Headlines</h1><article class="top"><h2>Rust 2024 ships</h2></article><article class="local"><h2>Bridge reopens</h2></article>"#;

fn newsroom() -> Program {
    Program::builder("newsroom")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            cx.handle(layer, 2)
        })
        .create(1, [Child::element("h1").child("Headlines")])
        .array(2, |cx, layer, p| {
            let stories = cx.value("stories");
            cx.for_each(layer, p, &Binding::item("story"), stories.entries())
        })
        .template(3, |cx, layer| {
            cx.handle(layer, 3)?;
            cx.handle(layer, 4)?;
            cx.handle(layer, 5)
        })
        .create(
            3,
            [Child::element("article")
                .keyed(STORY)
                .child(Child::element("h2").child(Child::anchor(5)))],
        )
        .attributes(4, |cx, layer, p| {
            let section = cx.value("story").field("section");
            cx.attributes(layer, p, STORY, [("class", section)])
        })
        .text(5, |cx, layer, p| {
            let title = cx.value("story").field("title");
            cx.text(layer, p, title)
        })
        .build()
}

fn story(title: &str, section: &str) -> Value {
    Value::object([("title", title), ("section", section)])
}

fn main() -> Result<(), RenderError> {
    env_logger::init();

    let mut applier = MemoryApplier::new();
    let container = applier.create_element("main");
    for node in materialize(&mut applier, &parse_fragment(SERVER_MARKUP))? {
        applier.insert_before(container, node, None)?;
    }
    applier.reset_stats();

    let mut renderer = Renderer::new(applier, container, newsroom());
    let first = story("Rust 2024 ships", "top");
    let second = story("Bridge reopens", "local");
    let third = story("Library extends hours", "local");

    renderer.mount(Value::object([(
        "stories",
        vec![first.clone(), second.clone()],
    )]))?;
    log::info!("hydrated: {:?}", renderer.applier().stats());
    println!("{}", renderer.applier().dump_tree(Some(container)));

    renderer.applier_mut().reset_stats();
    renderer.render(Value::object([("stories", vec![third, second, first])]))?;
    log::info!("reordered: {:?}", renderer.applier().stats());
    println!("{}", renderer.applier().dump_tree(Some(container)));
    Ok(())
}
