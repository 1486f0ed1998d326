use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stratum_core::{Applier, AttrKey, Binding, Child, MemoryApplier, Program, Renderer, Value};

const ROW_COUNT: usize = 256;
const RESHUFFLE_SAMPLES: &[usize] = &[32, 64, 128, 256];
const ROW: AttrKey = AttrKey::new(2, 0);

fn table() -> Program {
    Program::builder("table")
        .template(0, |cx, layer| cx.handle(layer, 1))
        .array(1, |cx, layer, p| {
            let rows = cx.value("rows");
            cx.for_each(layer, p, &Binding::item("row"), rows.entries())
        })
        .template(2, |cx, layer| {
            cx.handle(layer, 2)?;
            cx.handle(layer, 3)?;
            cx.handle(layer, 4)?;
            cx.handle(layer, 5)
        })
        .create(
            2,
            [Child::element("tr")
                .keyed(ROW)
                .child(Child::element("td").child(Child::anchor(4)))
                .child(Child::element("td").child(Child::anchor(5)))],
        )
        .attributes(3, |cx, layer, p| {
            let id = cx.value("row").field("id");
            cx.attributes(layer, p, ROW, [("data-id", id)])
        })
        .text(4, |cx, layer, p| {
            let label = cx.value("row").field("label");
            cx.text(layer, p, label)
        })
        .text(5, |cx, layer, p| {
            let id = cx.value("row").field("id");
            cx.text(layer, p, id)
        })
        .build()
}

fn rows(count: usize) -> Vec<Value> {
    (0..count)
        .map(|id| Value::object([("id", Value::from(id)), ("label", format!("Row {id}").into())]))
        .collect()
}

struct TableFixture {
    renderer: Renderer<MemoryApplier>,
    rows: Vec<Value>,
}

impl TableFixture {
    fn new(count: usize) -> Self {
        let mut applier = MemoryApplier::new();
        let container = applier.create_element("tbody");
        Self {
            renderer: Renderer::new(applier, container, table()),
            rows: rows(count),
        }
    }

    /// Renders the fixture's rows rotated left by `rotate`; rows keep their
    /// identity across calls.
    fn render(&mut self, rotate: usize) {
        let mut rows = self.rows.clone();
        rows.rotate_left(rotate % rows.len().max(1));
        self.renderer
            .render(Value::object([("rows", rows)]))
            .expect("render");
    }
}

fn bench_steady_state(c: &mut Criterion) {
    let mut fixture = TableFixture::new(ROW_COUNT);
    // Mount first so only reconciliation is measured.
    fixture.render(0);

    c.bench_function("reconcile_unchanged", |b| {
        b.iter(|| {
            fixture.render(0);
        });
    });
}

fn bench_reshuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_rotate");
    for &row_count in RESHUFFLE_SAMPLES {
        group.bench_with_input(
            BenchmarkId::new("rows", row_count),
            &row_count,
            |b, &row_count| {
                let mut fixture = TableFixture::new(row_count);
                fixture.render(0);
                let mut rotate = 0;
                b.iter(|| {
                    rotate += 1;
                    fixture.render(rotate);
                    black_box(fixture.renderer.applier().stats());
                });
            },
        );
    }
    group.finish();
}

fn bench_mount(c: &mut Criterion) {
    c.bench_function("mount_table", |b| {
        b.iter(|| {
            let mut fixture = TableFixture::new(ROW_COUNT);
            fixture.render(0);
            black_box(fixture.renderer.applier().len());
        });
    });
}

criterion_group!(reconcile, bench_steady_state, bench_reshuffle, bench_mount);
criterion_main!(reconcile);
