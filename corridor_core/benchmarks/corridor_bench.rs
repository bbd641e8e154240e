use bevy::math::{DVec2, DVec3};
use corridor_core::{
    build_terrain, CatmullRomCurve, CenterlineSource, CorridorConfig, CorridorEditor,
    GridMetadata, TerrainSettings,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn metadata(res: usize) -> GridMetadata {
    let extent = (res - 1) as f64;
    GridMetadata::new(res, DVec2::ZERO, DVec3::new(extent, 60.0, extent)).unwrap()
}

fn meander(extent: f64) -> CatmullRomCurve {
    let points = (0..6)
        .map(|i| {
            let t = i as f64 / 5.0;
            let wiggle = if i % 2 == 0 { 0.15 } else { -0.15 };
            DVec3::new(extent * (0.1 + 0.8 * t), 0.0, extent * (0.5 + wiggle))
        })
        .collect();
    CatmullRomCurve::new(points).unwrap()
}

fn bench_carve(c: &mut Criterion) {
    let mut group = c.benchmark_group("carve");
    let config = CorridorConfig::builtin();
    let editor = CorridorEditor::new(&config).unwrap();

    for res in [65usize, 129, 257, 513] {
        let meta = metadata(res);
        let baseline = build_terrain(meta, &TerrainSettings::default());
        let curve = meander((res - 1) as f64);
        group.bench_with_input(BenchmarkId::new("curve", res), &res, |b, _| {
            b.iter(|| editor.carve(&baseline, CenterlineSource::Curve(&curve)).unwrap())
        });
    }

    group.finish();
}

fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace");
    let config = CorridorConfig::builtin();
    let editor = CorridorEditor::new(&config).unwrap();

    for res in [129usize, 257, 513] {
        let meta = metadata(res);
        let settings = TerrainSettings {
            seed: 7,
            tilt: 1.5,
            ..TerrainSettings::default()
        };
        let baseline = build_terrain(meta, &settings);
        let start = DVec2::splat((res - 1) as f64 * 0.25);
        group.bench_with_input(BenchmarkId::new("carve", res), &res, |b, _| {
            b.iter(|| {
                editor
                    .carve(&baseline, CenterlineSource::Trace { start })
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_smooth(c: &mut Criterion) {
    let mut group = c.benchmark_group("smooth");
    let config = CorridorConfig::builtin();
    let editor = CorridorEditor::new(&config).unwrap();

    for res in [129usize, 257] {
        let grid = build_terrain(metadata(res), &TerrainSettings::default());
        group.bench_with_input(BenchmarkId::new("full", res), &res, |b, _| {
            b.iter(|| editor.smooth(&grid, None))
        });
    }

    group.finish();
}

criterion_group!(corridor_benches, bench_carve, bench_trace, bench_smooth);
criterion_main!(corridor_benches);
