//! Rendering benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fbcon::console::FbConsole;
use fbcon::core::{encode_str, CellAttr, Font, FontRegistry};
use fbcon::display::{MemoryFramebuffer, Visual};
use fbcon::render::ScrollDirection;
use fbcon::{Config, ConsoleSwitch, DisplayRegistry, VirtualConsole};

fn console(bpp: u8, visual: Visual) -> (FbConsole<MemoryFramebuffer>, VirtualConsole) {
    let mut fonts = FontRegistry::new();
    let data: Vec<u8> = (0..256 * 16).map(|i| (i * 37) as u8).collect();
    fonts.register(Font::new("bench8x16", 8, 16, 256, data).unwrap());

    let mut displays = DisplayRegistry::new();
    displays.register(MemoryFramebuffer::new(640, 400, bpp, visual));
    let mut vc = VirtualConsole::new();
    let console = FbConsole::startup(&displays, &fonts, &Config::default(), &mut vc).unwrap();
    (console, vc)
}

fn bench_putcs(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let line = encode_str(
        &"The quick brown fox jumps over the lazy dog. ".repeat(2)[..80],
        CellAttr::new(7, 1),
        false,
    );
    group.throughput(Throughput::Elements(80 * 25));

    for (name, bpp, visual) in [
        ("putcs_screen_8bpp", 8, Visual::PseudoColor),
        ("putcs_screen_32bpp", 32, Visual::TrueColor),
    ] {
        let (mut console, vc) = console(bpp, visual);
        group.bench_function(name, |b| {
            b.iter(|| {
                for row in 0..vc.rows {
                    console.putcs(black_box(&line), row, 0);
                }
            })
        });
    }

    group.finish();
}

fn bench_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let (mut console, vc) = console(32, Visual::TrueColor);
    group.bench_function("scroll_and_clear", |b| {
        b.iter(|| {
            console.scroll_region(0, vc.rows, ScrollDirection::Up, black_box(1));
            console.clear(&vc, vc.rows - 1, 0, 0, vc.cols);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_putcs, bench_scroll);
criterion_main!(benches);
