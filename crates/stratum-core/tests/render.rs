use stratum_core::{Applier, AttrKey, Binding, Child, Program, Value};
use stratum_testing::{init_logging, run_test_render, RenderTestRule, Rendered};

const ENTRY: AttrKey = AttrKey::new(2, 0);

/// `<li class={item.kind}><b>{item.title}</b></li>` per item of `news`.
fn news() -> Program {
    Program::builder("news")
        .template(0, |cx, layer| cx.handle(layer, 1))
        .array(1, |cx, layer, p| {
            let news = cx.value("news");
            cx.for_each(layer, p, &Binding::item("item"), news.entries())
        })
        .template(2, |cx, layer| {
            cx.handle(layer, 2)?;
            cx.handle(layer, 3)?;
            cx.handle(layer, 4)
        })
        .create(
            2,
            [Child::element("li")
                .keyed(ENTRY)
                .child(Child::element("b").child(Child::anchor(4)))],
        )
        .attributes(3, |cx, layer, p| {
            let kind = cx.value("item").field("kind");
            cx.attributes(layer, p, ENTRY, [("class", kind)])
        })
        .text(4, |cx, layer, p| {
            let title = cx.value("item").field("title");
            cx.text(layer, p, title)
        })
        .build()
}

fn item(title: &str, kind: &str) -> Value {
    Value::object([("title", title), ("kind", kind)])
}

fn news_state(items: Vec<Value>) -> Value {
    Value::object([("news", items)])
}

#[test]
fn rerendering_the_same_state_touches_nothing() {
    init_logging();
    run_test_render(news(), |rule| {
        let state = news_state(vec![item("a", "top"), item("b", "local")]);
        rule.mount(state.clone()).expect("mount");
        let stats = rule.rerender_stats(state).expect("rerender");
        assert_eq!(stats.content_created(), 0);
        assert_eq!(stats.comments_created, 0);
        assert_eq!(stats.inserts, 0);
        assert_eq!(stats.removals, 0);
    });
}

#[test]
fn loop_items_carry_their_attributes() {
    run_test_render(news(), |rule| {
        rule.mount(news_state(vec![item("a", "top"), item("b", "local")]))
            .expect("mount");
        assert_eq!(
            rule.html(),
            r#"<li class="top"><b>a</b></li><li class="local"><b>b</b></li>"#
        );
        assert_eq!(
            rule.snapshot()[1],
            Rendered::element("li")
                .attr("class", "local")
                .child(Rendered::element("b").child(Rendered::text("b")))
        );
    });
}

#[test]
fn reordering_keeps_element_identity() {
    run_test_render(news(), |rule| {
        let (a, b, c) = (item("a", "x"), item("b", "x"), item("c", "x"));
        let before = rule
            .mount(news_state(vec![a.clone(), b.clone(), c.clone()]))
            .expect("mount");
        rule.reset_stats();
        let after = rule.render(news_state(vec![c, a, b])).expect("render");
        assert_eq!(after, vec![before[2], before[0], before[1]]);
        assert_eq!(rule.stats().content_created(), 0);
        assert_eq!(
            rule.html(),
            r#"<li class="x"><b>c</b></li><li class="x"><b>a</b></li><li class="x"><b>b</b></li>"#
        );
    });
}

#[test]
fn items_mutated_in_place_are_updated_not_rebuilt() {
    run_test_render(news(), |rule| {
        let (a, b) = (item("a", "x"), item("b", "x"));
        let before = rule
            .mount(news_state(vec![a.clone(), b.clone()]))
            .expect("mount");
        rule.reset_stats();

        b.set_field("kind", "y");
        let after = rule
            .render(news_state(vec![a.clone(), b.clone()]))
            .expect("render");
        assert_eq!(after, before);
        assert_eq!(rule.applier().attribute(after[1], "class"), Some("y"));
        assert_eq!(rule.stats().content_created(), 0);
        assert_eq!(rule.stats().removals, 0);

        // an equal copy is a different item
        let after = rule
            .render(news_state(vec![item("a", "x"), b]))
            .expect("render");
        assert_ne!(after[0], before[0]);
        assert!(!rule.applier().contains(before[0]));
        assert_eq!(after[1], before[1]);
    });
}

#[test]
fn hydration_reuses_server_markup() {
    let html = r#"<li class="top"><b>a</b></li><li class="old"><b>stale</b></li><p>extra</p>"#;
    let mut rule = RenderTestRule::with_markup(news(), html).expect("markup");
    let server = rule.applier().children(rule.container());

    let nodes = rule
        .mount(news_state(vec![item("a", "top"), item("b", "local")]))
        .expect("mount");
    assert_eq!(nodes, server[..2].to_vec());
    assert_eq!(rule.stats().content_created(), 0);
    assert_eq!(
        rule.html(),
        r#"<li class="top"><b>a</b></li><li class="local"><b>b</b></li>"#
    );
}

fn switch() -> Program {
    Program::builder("switch")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            let a = cx.value("a").as_number().unwrap_or_default();
            let b = cx.value("b").as_number().unwrap_or_default();
            if a > b {
                cx.handle(layer, 2)
            } else {
                cx.handle(layer, 3)
            }
        })
        .create(1, [Child::element("h2").child("Switch")])
        .create(2, [Child::text("case 1")])
        .create(3, [Child::text("default statement")])
        .build()
}

fn operands(a: i32, b: i32) -> Value {
    Value::object([("a", a), ("b", b)])
}

#[test]
fn switch_branches_replace_each_other() {
    run_test_render(switch(), |rule| {
        let nodes = rule.mount(operands(2, 1)).expect("mount");
        assert_eq!(rule.html(), "<h2>Switch</h2>case 1");
        let heading = nodes[0];

        let nodes = rule.render(operands(1, 2)).expect("render");
        assert_eq!(rule.html(), "<h2>Switch</h2>default statement");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], heading);

        rule.render(operands(3, 0)).expect("render");
        assert_eq!(rule.html(), "<h2>Switch</h2>case 1");
    });
}

const FIELD: AttrKey = AttrKey::new(1, 0);

fn field() -> Program {
    Program::builder("field")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            cx.handle(layer, 2)
        })
        .create(1, [Child::element("input").attr("type", "text").keyed(FIELD)])
        .attributes(2, |cx, layer, p| {
            let hidden = cx.value("hidden");
            let value = cx.value("value");
            cx.attributes(layer, p, FIELD, [("hidden", hidden), ("value", value)])
        })
        .build()
}

#[test]
fn boolean_attributes_toggle_properties() {
    run_test_render(field(), |rule| {
        let state = |hidden: bool| {
            Value::object([("hidden", Value::from(hidden)), ("value", Value::from("x"))])
        };
        let nodes = rule.mount(state(true)).expect("mount");
        let input = nodes[0];
        assert_eq!(rule.html(), r#"<input type="text" value="x" hidden>"#);

        rule.render(state(false)).expect("render");
        assert_eq!(rule.applier().property(input, "hidden"), Some(false));
        assert_eq!(rule.applier().attribute(input, "hidden"), None);
        assert_eq!(rule.html(), r#"<input type="text" value="x">"#);
    });
}

fn body() -> Program {
    Program::builder("body")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            cx.handle(layer, 2)
        })
        .create(
            1,
            [
                Child::Doctype,
                Child::element("article").child(Child::anchor(2)).into(),
            ],
        )
        .text(2, |cx, layer, p| {
            let body = cx.value("body");
            cx.text(layer, p, body)
        })
        .build()
}

#[test]
fn text_switches_between_plain_and_markup() {
    run_test_render(body(), |rule| {
        rule.mount(Value::object([("body", "plain")])).expect("mount");
        assert_eq!(rule.html(), "<article>plain</article>");

        rule.render(Value::object([("body", "<em>rich</em> &amp; more")]))
            .expect("render");
        assert_eq!(rule.html(), "<article><em>rich</em> &amp; more</article>");

        rule.render(Value::object([("body", 42)])).expect("render");
        assert_eq!(rule.html(), "<article>42</article>");

        rule.render(Value::Null).expect("render");
        assert_eq!(rule.html(), "<article></article>");
    });
}

#[test]
fn execute_locals_feed_later_positions() {
    let program = Program::builder("totals")
        .template(0, |cx, layer| {
            cx.handle(layer, 1)?;
            cx.handle(layer, 2)
        })
        .execute(1, |cx, _, _| {
            let total: f64 = cx
                .value("prices")
                .entries()
                .iter()
                .filter_map(|(_, price)| price.as_number())
                .sum();
            cx.set("total", total);
            Ok(())
        })
        .text(2, |cx, layer, p| {
            let total = cx.value("total");
            cx.text(layer, p, format!("total: {total}"))
        })
        .build();
    run_test_render(program, |rule| {
        rule.mount(Value::object([("prices", Value::array([1.5, 2.5]))]))
            .expect("mount");
        assert_eq!(rule.html(), "total: 4");
        rule.render(Value::object([("prices", Value::array([1.25]))]))
            .expect("render");
        assert_eq!(rule.html(), "total: 1.25");
    });
}

#[test]
fn scope_fills_in_names_state_lacks() {
    let program = Program::builder("scoped")
        .template(0, |cx, layer| cx.handle(layer, 1))
        .text(1, |cx, layer, p| {
            let text = format!("{}/{}", cx.value("site"), cx.value("page"));
            cx.text(layer, p, text)
        })
        .build();
    run_test_render(program, |rule| {
        let scope = Value::object([("site", "docs"), ("page", "shadowed")]);
        rule.render_with_scope(scope, Value::object([("page", "intro")]))
            .expect("render");
        assert_eq!(rule.html(), "docs/intro");
    });
}
