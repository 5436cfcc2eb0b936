// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::f64::consts::TAU;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use parcelview_geom::{Geometry, LatLng, Position, build_inverse_mask, rings_from_geometry};
use parcelview_stage::headless::HeadlessMap;
use parcelview_stage::overlay::measure_area;
use parcelview_stage::{ParcelRegistry, Roll};

fn gen_grid(n: usize, cell: f64) -> Vec<(Roll, Geometry)> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            let ring = vec![
                [x0, y0],
                [x0 + cell, y0],
                [x0 + cell, y0 + cell],
                [x0, y0 + cell],
                [x0, y0],
            ];
            out.push((Roll::new(format!("{x}-{y}")), Geometry::Polygon(vec![ring])));
        }
    }
    out
}

fn gen_circle(k: usize, cx: f64, cy: f64, r: f64) -> Vec<Position> {
    (0..=k)
        .map(|i| {
            let t = i as f64 / k as f64 * TAU;
            [cx + r * t.cos(), cy + r * t.sin()]
        })
        .collect()
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 11) as f64) / ((1_u64 << 53) as f64)
    }
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    for &n in &[32_usize, 128] {
        let cell = 0.001;
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("load_n{}", n), |b| {
            b.iter_batched(
                || gen_grid(n, cell),
                |parcels| black_box(ParcelRegistry::new(parcels, [])),
                BatchSize::LargeInput,
            );
        });

        let registry = ParcelRegistry::new(gen_grid(n, cell), []);
        let extent = n as f64 * cell;
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
        let points: Vec<LatLng> = (0..1_024)
            .map(|_| LatLng::new(rng.next_f64() * extent, rng.next_f64() * extent))
            .collect();
        group.bench_function(format!("hit_test_1024_n{}", n), |b| {
            b.iter(|| {
                points
                    .iter()
                    .filter(|&&p| registry.hit_test(p).is_some())
                    .count()
            });
        });
    }
    group.finish();
}

fn bench_area_and_mask(c: &mut Criterion) {
    let map = HeadlessMap::default();
    let mut group = c.benchmark_group("area");
    for &k in &[16_usize, 256, 4_096] {
        let geometry = Geometry::Polygon(vec![gen_circle(k, -73.5, 45.5, 0.001)]);
        let Ok(rings) = rings_from_geometry(&geometry) else {
            continue;
        };
        group.throughput(Throughput::Elements(k as u64));
        group.bench_function(format!("measure_k{}", k), |b| {
            b.iter(|| black_box(measure_area(black_box(&rings), &map)));
        });
        group.bench_function(format!("inverse_mask_k{}", k), |b| {
            b.iter(|| black_box(build_inverse_mask(Some(&geometry), black_box(&rings))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_registry, bench_area_and_mask);
criterion_main!(benches);
