// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query stage basics.
//!
//! Click a parcel, let the highlight blink, re-click it, click its neighbor,
//! and exit. Every status line is printed as it would appear to the operator.
//!
//! Run:
//! - `cargo run -p parcelview_demos --example query_stage_basics`
//! - `RUST_LOG=parcelview_stage=debug cargo run -p parcelview_demos --example query_stage_basics`

use std::time::Duration;

use parcelview_geom::{Geometry, LatLng, Position};
use parcelview_stage::headless::{HeadlessMap, ManualScheduler, RecordingShell, SeverityTable};
use parcelview_stage::{MapEngine, ParcelRegistry, QueryStage, Roll, Severity, StageConfig};
use tracing_subscriber::EnvFilter;

fn lot(x0: f64, y0: f64) -> Geometry {
    let s = 0.0008;
    let ring: Vec<Position> = vec![[x0, y0], [x0 + s, y0], [x0 + s, y0 + s], [x0, y0 + s], [x0, y0]];
    Geometry::Polygon(vec![ring])
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = ParcelRegistry::new(
        [
            (Roll::from("0042-17"), lot(-73.5540, 45.5070)),
            (Roll::from("0042-18"), lot(-73.5530, 45.5070)),
        ],
        [],
    );
    let records: SeverityTable = [(Roll::from("0042-18"), Severity::Medium)].into_iter().collect();
    let mut stage = QueryStage::with_records(
        HeadlessMap::default(),
        ManualScheduler::new(),
        RecordingShell::new(),
        records,
        registry,
        StageConfig::default(),
    );

    println!("== Click 0042-17 ==");
    println!("{:?}", stage.click(LatLng::new(45.5074, -73.5536)));
    println!(
        "zoom {:.0}, center {:?}",
        stage.engine().zoom(),
        stage.engine().center()
    );

    println!("== Blink for two seconds ==");
    let fired = stage.scheduler_mut().advance(Duration::from_secs(2));
    for handle in fired {
        stage.on_blink_tick(handle);
        let roll = Roll::from("0042-17");
        let opacity = stage.engine().style_of(&roll).map(|s| s.fill_opacity);
        println!("tick {:?}: blink_on={} fill={:?}", handle, stage.selection().blink_on(), opacity);
    }

    println!("== Re-click, then the neighbor ==");
    println!("{:?}", stage.click(LatLng::new(45.5074, -73.5536)));
    println!("{:?}", stage.click(LatLng::new(45.5074, -73.5526)));

    stage.exit();
    println!("live timers after exit: {}", stage.scheduler().live());
    println!(
        "0042-18 outline after exit: {:?}",
        stage.engine().style_of(&Roll::from("0042-18")).map(|s| s.stroke)
    );

    println!("== Status log ==");
    for line in stage.shell().lines() {
        println!("  {line}");
    }
}
