//! Locator Operations Benchmarks
//!
//! Selector parsing, role resolution and rendering run on every driver call,
//! so they sit on the hot path of each poll.
//!
//! Run with: `cargo bench --bench locator_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pageprobe::prelude::*;

fn bench_selector_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_parsing");

    let selectors = vec![
        ("simple_class", ".swiper-slide"),
        ("tag_class", "form.lead-form"),
        ("attribute", "button[data-action=\"next\"]"),
        ("presence", "input[required]"),
        ("negation", ".swiper-slide:not(.swiper-slide-duplicate)"),
        ("compound", "div#main.product-slider-main.is-ready[data-loop=\"true\"]"),
    ];

    for (name, selector) in selectors {
        group.bench_with_input(BenchmarkId::from_parameter(name), &selector, |bench, sel| {
            bench.iter(|| {
                let parsed = Selector::parse(black_box(sel)).unwrap();
                black_box(parsed);
            });
        });
    }

    group.finish();
}

fn bench_role_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_resolution");
    let markup = MarkupContract::default();

    let roles = vec![
        ("active_slide", Role::ActiveSlide(Carousel::Main)),
        ("slide_image", Role::SlideImage(Carousel::Preview, 4)),
        ("field_input", Role::FieldInput(FormField::Email)),
        ("error_indicator", Role::ErrorIndicator(FormField::Zip)),
        ("gallery_counter", Role::GalleryCounter),
    ];

    for (name, role) in roles {
        group.bench_with_input(BenchmarkId::from_parameter(name), &role, |bench, role| {
            bench.iter(|| black_box(resolve(&markup, *role)));
        });
    }

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_rendering");
    let markup = MarkupContract::default();
    let locator = resolve(&markup, Role::ActiveSlideImage(Carousel::Main));

    group.bench_function("to_css", |bench| {
        bench.iter(|| black_box(locator.to_css()));
    });
    group.bench_function("to_js", |bench| {
        bench.iter(|| black_box(locator.to_js()));
    });

    group.finish();
}

fn bench_image_identity(c: &mut Criterion) {
    let mut group = c.benchmark_group("image_identity");

    let sources = vec![
        ("plain", "front.jpg"),
        ("hashed", "https://cdn.test/cars/42/front.3fa9c1.jpg?w=640#x"),
        ("proxied", "/_next/image?url=%2Fcars%2Finterior.91ab.jpg&w=1080&q=75"),
    ];

    for (name, src) in sources {
        group.bench_with_input(BenchmarkId::from_parameter(name), &src, |bench, src| {
            bench.iter(|| black_box(image_identity(black_box(src))));
        });
    }

    group.finish();
}

fn bench_dom_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("fake_dom_find");
    let markup = MarkupContract::default();

    for slides in [5usize, 20, 80] {
        let mut dom = FakeDom::new("http://localhost/");
        let root = dom.append(None, "div", &[("class", "product-slider-main")], "");
        for i in 0..slides {
            let class = if i == 0 {
                "swiper-slide swiper-slide-active"
            } else {
                "swiper-slide"
            };
            let index = i.to_string();
            let _ = dom.append(
                Some(root),
                "div",
                &[("class", class), ("data-swiper-slide-index", index.as_str())],
                "",
            );
        }
        let locator = resolve(&markup, Role::ActiveSlide(Carousel::Main));
        group.bench_with_input(BenchmarkId::from_parameter(slides), &dom, |bench, dom| {
            bench.iter(|| black_box(dom.find(&locator)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_selector_parsing,
    bench_role_resolution,
    bench_rendering,
    bench_image_identity,
    bench_dom_matching,
);
criterion_main!(benches);
