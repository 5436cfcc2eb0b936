// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Address search.
//!
//! Rank a few queries against a small address index, then feed the best match
//! into the query stage.
//!
//! Run:
//! - `cargo run -p parcelview_demos --example address_search`

use parcelview_geom::{Geometry, Position};
use parcelview_search::{AddressIndex, AddressRow};
use parcelview_stage::headless::{HeadlessMap, ManualScheduler, RecordingShell};
use parcelview_stage::{ParcelRegistry, QueryStage, Roll, StageConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let index = AddressIndex::new([
        AddressRow::new("12 Rue Saint-Paul", "0042-17", 45.5074, -73.5536),
        AddressRow::new("120 Rue Saint-Paul", "0042-18", 45.5074, -73.5526),
        AddressRow::new("12 Rue Saint-Pierre", "0051-02", 45.5031, -73.5569),
        AddressRow::new("3 Place d'Youville", "0060-11", 45.5011, -73.5560),
    ]);

    for query in ["12 rue saint-paul", "12", "saint p", "youville", "zzz"] {
        println!("== {query:?} ==");
        for hit in index.rank(query, 3) {
            println!("  {:>7.1}  {} ({})", hit.score, hit.row.label, hit.row.roll);
        }
    }

    let ring: Vec<Position> = vec![
        [-73.5540, 45.5070],
        [-73.5532, 45.5070],
        [-73.5532, 45.5078],
        [-73.5540, 45.5078],
        [-73.5540, 45.5070],
    ];
    let registry = ParcelRegistry::new([(Roll::from("0042-17"), Geometry::Polygon(vec![ring]))], []);
    let mut stage = QueryStage::new(
        HeadlessMap::default(),
        ManualScheduler::new(),
        RecordingShell::new(),
        registry,
        StageConfig::default(),
    );

    println!("== Submit ==");
    match stage.submit_address("12 Rue Saint-Paul.", &index) {
        Some(best) => println!("entered {} via {:?}", best.row.roll, best.row.label),
        None => println!("no match"),
    }
    stage.submit_address("nowhere", &index);
    for line in stage.shell().lines() {
        println!("  {line}");
    }
}
