//! Segmentation timing on synthetic frames of common camera widths.
//!
//! Run with: cargo bench -p trunk-gauge-segment

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use trunk_gauge_core::{Frame, PixelLayout};
use trunk_gauge_segment::{PredicateKind, SegmenterParams, TrunkSegmenter};

fn trunk_frame(width: usize) -> Frame {
    let height = width * 3 / 4;
    let start = width * 2 / 5;
    let end = width * 3 / 5;
    Frame::from_rgb_fn(width, height, PixelLayout::Rgba8, |x, y| {
        if (start..end).contains(&x) {
            [96, 72, 52]
        } else if y % 7 == 0 {
            [60, 140, 80]
        } else {
            [200, 215, 235]
        }
    })
    .expect("synthetic frame")
}

fn bench_predicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");
    for width in [640usize, 1920, 4000] {
        let frame = trunk_frame(width);
        group.throughput(Throughput::Elements(width as u64));
        for kind in [PredicateKind::Tone, PredicateKind::EdgePair] {
            let segmenter = TrunkSegmenter::new(SegmenterParams {
                predicate: kind,
                ..SegmenterParams::default()
            });
            group.bench_with_input(
                BenchmarkId::new(format!("{kind:?}"), width),
                &frame,
                |b, frame| b.iter(|| segmenter.segment(black_box(&frame.view()))),
            );
        }
    }
    group.finish();
}

fn bench_working_width(c: &mut Criterion) {
    let frame = trunk_frame(4000);
    let segmenter = TrunkSegmenter::new(SegmenterParams {
        working_width: Some(600),
        ..SegmenterParams::default()
    });
    c.bench_function("segment/working_width_600", |b| {
        b.iter(|| segmenter.segment(black_box(&frame.view())))
    });
}

criterion_group!(benches, bench_predicates, bench_working_width);
criterion_main!(benches);
