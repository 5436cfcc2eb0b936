// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use parcelview_search::{AddressIndex, AddressRow, normalize};

const STREETS: [&str; 8] = [
    "Main St",
    "Rue Saint-Paul",
    "Oak Ave",
    "Boul. Laurier",
    "Chemin du Lac",
    "2e Avenue",
    "Elm St",
    "Rang Saint-Joseph",
];

fn gen_rows(n: usize) -> Vec<AddressRow> {
    (0..n)
        .map(|i| {
            let street = STREETS[i % STREETS.len()];
            let number = 1 + i / STREETS.len();
            AddressRow::new(
                format!("{number} {street}"),
                format!("{:04}-{:02}", i / 100, i % 100),
                45.0 + i as f64 * 1e-5,
                -73.5,
            )
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_label", |b| {
        b.iter(|| normalize(black_box("  1234,  Boul. Saint-Laurent  Est. ")));
    });
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    for &n in &[1_000_usize, 10_000, 50_000] {
        let index = AddressIndex::new(gen_rows(n));
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("exact_best_n{}", n), |b| {
            b.iter(|| black_box(index.best(black_box("120 main st"))));
        });
        group.bench_function(format!("prefix_top8_n{}", n), |b| {
            b.iter(|| black_box(index.rank(black_box("12"), 8)));
        });
        group.bench_function(format!("tokens_top8_n{}", n), |b| {
            b.iter(|| black_box(index.rank(black_box("saint paul"), 8)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_rank);
criterion_main!(benches);
