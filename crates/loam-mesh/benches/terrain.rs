use criterion::{Criterion, black_box, criterion_group, criterion_main};

use loam_mesh::{HeightCurve, build_terrain_mesh};
use loam_noise::{NoiseSettings, generate_height_map};

fn bench_build_terrain_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_terrain_mesh");
    let map = generate_height_map(241, 241, &NoiseSettings::default(), [0.0, 0.0]);
    let curve = HeightCurve::from_keys(vec![(0.0, 0.0), (0.4, 0.05), (1.0, 1.0)]);
    for lod in [0u32, 1, 2, 4] {
        group.bench_function(format!("bordered_241_lod{lod}"), |b| {
            b.iter(|| black_box(build_terrain_mesh(&map, 30.0, &curve, lod)))
        });
    }
    group.finish();
}

fn bench_generate_height_map(c: &mut Criterion) {
    let settings = NoiseSettings::default();
    c.bench_function("generate_height_map_241", |b| {
        b.iter(|| black_box(generate_height_map(241, 241, &settings, [238.0, -476.0])))
    });
}

criterion_group!(benches, bench_build_terrain_mesh, bench_generate_height_map);
criterion_main!(benches);
