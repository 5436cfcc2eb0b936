// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Satellite mask and size overlays.
//!
//! Select a parcel with a buffer zone, reveal imagery through the inverse mask,
//! label its area, simulate the surface dropping layers on zoom, and let the
//! viewport-change rebuild restore them. Then try a parcel with no zone.
//!
//! Run:
//! - `cargo run -p parcelview_demos --example satellite_mask`

use parcelview_geom::{Geometry, Position};
use parcelview_stage::headless::{HeadlessLayer, HeadlessMap, ManualScheduler, RecordingShell};
use parcelview_stage::{EnterOptions, ParcelRegistry, QueryStage, Roll, StageConfig};
use tracing_subscriber::EnvFilter;

fn square(x0: f64, y0: f64, s: f64) -> Vec<Position> {
    vec![[x0, y0], [x0 + s, y0], [x0 + s, y0 + s], [x0, y0 + s], [x0, y0]]
}

fn describe(map: &HeadlessMap) {
    for (id, layer) in map.layers() {
        match layer {
            HeadlessLayer::Imagery => println!("  {id:?} imagery"),
            HeadlessLayer::Polygon { rings, style } => println!(
                "  {id:?} polygon: {} ring(s), even_odd={}, dashed={}",
                rings.len(),
                style.even_odd,
                style.dashed
            ),
            HeadlessLayer::Label { text, .. } => println!("  {id:?} label {text:?}"),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = ParcelRegistry::new(
        [
            (Roll::from("A"), Geometry::Polygon(vec![square(2.3500, 48.8500, 0.0010)])),
            (Roll::from("N"), Geometry::Polygon(vec![square(2.3530, 48.8500, 0.0010)])),
        ],
        // An "+8 m" style buffer around A only.
        [(Roll::from("A"), Geometry::Polygon(vec![square(2.3499, 48.8499, 0.0012)]))],
    );
    let mut stage = QueryStage::new(
        HeadlessMap::default(),
        ManualScheduler::new(),
        RecordingShell::new(),
        registry,
        StageConfig::default(),
    );

    stage.enter(Roll::from("A"), EnterOptions::from_source("demo"));
    if let Err(err) = stage.toggle_satellite(Some(true)) {
        println!("satellite refused: {err}");
    }
    if let Err(err) = stage.toggle_size(Some(true)) {
        println!("size refused: {err}");
    }
    println!("== Layers for A ==");
    describe(stage.engine());

    println!("== Surface dropped its layers; viewport change ==");
    stage.engine_mut().clear_layers();
    println!("{:?}", stage.on_viewport_change());
    println!("{:?}", stage.on_viewport_change());
    while stage.rebuild_in_flight() {
        println!("{:?}", stage.complete_rebuilds());
    }
    describe(stage.engine());

    println!("== Switch to N (no zone) ==");
    stage.enter(Roll::from("N"), EnterOptions::from_source("demo"));
    println!(
        "satellite on: {}, size on: {}",
        stage.satellite().is_on(),
        stage.size().is_on()
    );
    describe(stage.engine());

    stage.exit();
    println!("== Status log ==");
    for line in stage.shell().lines() {
        println!("  {line}");
    }
}
