// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the query stage over the headless host.

use core::time::Duration;

use parcelview_geom::{Geometry, LatLng, Position};
use parcelview_search::{AddressIndex, AddressRow};
use parcelview_stage::headless::{
    HeadlessLayer, HeadlessMap, LayerKinds, ManualScheduler, RecordingShell, SeverityTable,
};
use parcelview_stage::{
    ClickOutcome, DrawError, EnterOptions, MapEngine, OverlayError, OverlayKind, ParcelRegistry,
    QueryStage, RebuildReport, Roll, Severity, ShapeStyle, StageConfig,
};

type Stage = QueryStage<HeadlessMap, ManualScheduler, RecordingShell, SeverityTable>;

fn lot(x0: f64, y0: f64, size: f64) -> Vec<Position> {
    vec![
        [x0, y0],
        [x0 + size, y0],
        [x0 + size, y0 + size],
        [x0, y0 + size],
        [x0, y0],
    ]
}

fn polygon(roll: &str, ring: Vec<Position>) -> (Roll, Geometry) {
    (Roll::from(roll), Geometry::Polygon(vec![ring]))
}

/// Parcels A and B have zones; N does not.
fn registry() -> ParcelRegistry {
    ParcelRegistry::new(
        [
            polygon("A", lot(0.0, 0.0, 0.001)),
            polygon("B", lot(0.002, 0.0, 0.001)),
            polygon("N", lot(0.004, 0.0, 0.001)),
        ],
        [
            polygon("A", lot(-0.0001, -0.0001, 0.0012)),
            polygon("B", lot(0.0019, -0.0001, 0.0012)),
        ],
    )
}

fn stage() -> Stage {
    QueryStage::with_records(
        HeadlessMap::default(),
        ManualScheduler::new(),
        RecordingShell::new(),
        SeverityTable::new(),
        registry(),
        StageConfig::default(),
    )
}

const IN_A: LatLng = LatLng::new(0.0005, 0.0005);
const IN_B: LatLng = LatLng::new(0.0005, 0.0025);

#[test]
fn entering_frames_and_zooms_in() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::from_source("test"));
    assert_eq!(s.active_roll(), Some(&Roll::from("A")));
    assert!(s.selection().in_query_stage());
    assert!(s.engine().zoom() >= 18.0);
    let c = s.engine().center();
    assert!((c.lat - 0.0005).abs() < 1e-9 && (c.lng - 0.0005).abs() < 1e-9);
    assert_eq!(s.shell().last(), Some("Query stage: A (test)"));
    assert_eq!(s.shell().menus_dismissed(), 1);
}

// Re-entering the same roll keeps exactly one live timer.
#[test]
fn enter_same_roll_twice_is_idempotent() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    let first = s.blink_handle().unwrap();
    s.enter(Roll::from("A"), EnterOptions::default());
    assert_eq!(s.active_roll(), Some(&Roll::from("A")));
    assert_eq!(s.scheduler().live(), 1);
    assert_eq!(s.scheduler().started(), 2);
    assert!(!s.on_blink_tick(first), "stale timer must be ignored");
    assert_eq!(s.shell().last(), Some("Query stage: A"));
}

#[test]
fn exit_twice_is_a_no_op_the_second_time() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.exit();
    s.exit();
    assert!(s.active_roll().is_none());
    assert!(!s.selection().blink_on());
    assert_eq!(s.scheduler().live(), 0);
    assert_eq!(s.shell().last(), Some("Ready."));
    let style = s.engine().style_of(&Roll::from("A")).unwrap();
    assert_eq!(style.weight, 1.0);
}

// Only the active parcel is restyled by the blink.
#[test]
fn blink_pulses_only_the_active_parcel() {
    let mut s = stage();
    s.enter(Roll::from("B"), EnterOptions::default());
    s.enter(Roll::from("A"), EnterOptions::default());
    s.engine_mut().take_restyled();

    let fired = s.scheduler_mut().advance(Duration::from_millis(650 * 3));
    assert_eq!(fired.len(), 3);
    let mut phases = Vec::new();
    for handle in fired {
        assert!(s.on_blink_tick(handle));
        phases.push(s.selection().blink_on());
    }
    assert_eq!(phases, [true, false, true]);
    assert_eq!(s.engine_mut().take_restyled(), vec![Roll::from("A"); 3]);

    s.exit();
    assert!(s.scheduler_mut().advance(Duration::from_secs(5)).is_empty());
}

#[test]
fn missing_zone_keeps_satellite_off() {
    let mut s = stage();
    s.enter(Roll::from("N"), EnterOptions::default());
    assert_eq!(
        s.toggle_satellite(Some(true)),
        Err(OverlayError::ZoneNotFound {
            roll: Roll::from("N")
        })
    );
    assert!(!s.satellite().is_on());
    assert_eq!(s.engine().layer_count(), 0);
    assert_eq!(
        s.shell().last(),
        Some("Zone not found for roll N (join mismatch).")
    );
}

#[test]
fn toggling_without_selection_is_refused() {
    let mut s = stage();
    assert_eq!(s.toggle_size(None), Err(OverlayError::NoSelection));
    assert!(!s.size().is_on());
    assert_eq!(s.shell().last(), Some("Select a parcel first."));
}

#[test]
fn render_failure_rolls_back() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.engine_mut().set_unsupported(LayerKinds::POLYGON);
    assert!(matches!(
        s.toggle_satellite(Some(true)),
        Err(OverlayError::Render {
            overlay: OverlayKind::Satellite,
            ..
        })
    ));
    assert!(!s.satellite().is_on());
    assert_eq!(s.engine().layer_count(), 0);
}

fn size_outline_origin(s: &Stage) -> Option<LatLng> {
    s.engine().layers().find_map(|(_, layer)| match layer {
        HeadlessLayer::Polygon { rings, style } if *style == ShapeStyle::SIZE_OUTLINE => {
            rings.first()?.first().copied()
        }
        _ => None,
    })
}

// Overlays that are on follow the selection to the new roll.
#[test]
fn overlays_rebuild_when_selection_changes() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    assert_eq!(s.toggle_satellite(Some(true)), Ok(true));
    assert_eq!(s.toggle_size(Some(true)), Ok(true));
    assert_eq!(s.engine().layer_count(), 5);
    assert_eq!(size_outline_origin(&s), Some(LatLng::new(0.0, 0.0)));

    assert_eq!(s.click(IN_B), ClickOutcome::Entered(Roll::from("B")));
    assert!(s.satellite().is_on() && s.size().is_on());
    assert_eq!(s.engine().layer_count(), 5);
    assert_eq!(s.engine().count_of(LayerKinds::IMAGERY), 1);
    assert_eq!(size_outline_origin(&s), Some(LatLng::new(0.0, 0.002)));
    assert!(s.shell().lines().iter().any(|l| l == "Satellite ON B"));

    // N has no zone: the satellite overlay drops to off, size follows.
    s.enter(Roll::from("N"), EnterOptions::default());
    assert!(!s.satellite().is_on());
    assert!(s.size().is_on());
    assert_eq!(s.engine().count_of(LayerKinds::IMAGERY), 0);
    let tail: Vec<&str> = s.shell().lines().iter().rev().take(3).map(String::as_str).collect();
    assert_eq!(tail[0], "Query stage: N");
    assert!(tail[1].starts_with("Size ON N: "), "{tail:?}");
    assert_eq!(tail[2], "Zone not found for roll N (join mismatch).");
}

// Overlay messages come first; the query stage line is the last word.
#[test]
fn query_stage_status_follows_overlay_rebuild() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.toggle_satellite(Some(true)).unwrap();
    s.click(IN_B);
    let tail: Vec<&str> = s.shell().lines().iter().rev().take(2).map(String::as_str).collect();
    assert_eq!(tail, ["Query stage: B (left-click)", "Satellite ON B"]);
}

#[test]
fn exit_tears_overlays_down_before_clearing() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.toggle_satellite(Some(true)).unwrap();
    s.toggle_size(Some(true)).unwrap();
    s.exit();
    let tail: Vec<&str> = s.shell().lines().iter().rev().take(3).map(String::as_str).collect();
    assert_eq!(tail, ["Ready.", "Size OFF A", "Satellite OFF A"]);
    assert_eq!(s.engine().layer_count(), 0);
    assert!(!s.satellite().is_on() && !s.size().is_on());
}

#[test]
fn size_label_shows_area() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.toggle_size(None).unwrap();
    let area = s.size().area_square_meters().unwrap();
    assert!((area - 12_392.0).abs() < 50.0, "area {area}");
    assert_eq!(s.engine().labels(), ["3.06 acres"]);
    assert_eq!(s.shell().last(), Some("Size ON A: 3.06 acres"));
}

#[test]
fn viewport_change_restores_dropped_layers() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.toggle_satellite(Some(true)).unwrap();
    s.engine_mut().clear_layers();
    let report = s.on_viewport_change();
    assert_eq!(report.satellite, RebuildReport::Started);
    assert_eq!(report.size, RebuildReport::Ignored);
    assert!(s.rebuild_in_flight());

    let report = s.complete_rebuilds();
    assert_eq!(
        report.satellite,
        RebuildReport::Rebuilt {
            passes: 1,
            built: true
        }
    );
    assert_eq!(report.size, RebuildReport::Ignored);
    assert!(!s.rebuild_in_flight());
    assert_eq!(s.engine().layer_count(), 3);
    assert_eq!(s.on_viewport_change().satellite, RebuildReport::Ignored);
}

// A zoom gesture fires many viewport events while the rebuild is in flight.
#[test]
fn viewport_burst_costs_at_most_two_passes() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.toggle_satellite(Some(true)).unwrap();
    s.toggle_size(Some(true)).unwrap();
    s.engine_mut().clear_layers();

    let mut started = 0;
    let mut coalesced = 0;
    let mut passes = 0;
    let mut outcome = None;
    for frame in 0..10 {
        for _ in 0..50 {
            let report = s.on_viewport_change();
            for r in [report.satellite, report.size] {
                match r {
                    RebuildReport::Started => started += 1,
                    RebuildReport::Coalesced => coalesced += 1,
                    _ => {}
                }
            }
        }
        if !s.rebuild_in_flight() {
            continue;
        }
        let report = s.complete_rebuilds();
        passes += 1;
        if let RebuildReport::Rebuilt { passes, built } = report.satellite {
            outcome = Some((frame, passes, built));
        }
        // The surface drops the layers again while the extra pass is owed.
        if frame == 0 {
            s.engine_mut().clear_layers();
        }
    }
    assert_eq!(started, 2, "one admission per overlay");
    assert!(coalesced >= 98, "coalesced {coalesced}");
    assert_eq!(passes, 2);
    assert_eq!(outcome, Some((1, 2, true)));
    assert!(!s.rebuild_in_flight());
    assert_eq!(s.engine().layer_count(), 5);
}

#[test]
fn failed_rebuild_leaves_no_unmasked_imagery() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.toggle_satellite(Some(true)).unwrap();
    s.engine_mut().clear_kinds(LayerKinds::POLYGON);
    s.engine_mut().set_unsupported(LayerKinds::POLYGON);

    s.on_viewport_change();
    let report = s.complete_rebuilds();
    assert_eq!(
        report.satellite,
        RebuildReport::Rebuilt {
            passes: 1,
            built: false
        }
    );
    assert_eq!(s.engine().count_of(LayerKinds::IMAGERY), 0);
    assert_eq!(s.engine().layer_count(), 0);
    assert!(s.satellite().is_on());
}

#[test]
fn draw_mode_needs_satellite() {
    let mut s = stage();
    s.enter(Roll::from("N"), EnterOptions::default());
    assert!(matches!(
        s.enable_draw(),
        Err(DrawError::SatelliteUnavailable(
            OverlayError::ZoneNotFound { .. }
        ))
    ));
    assert!(!s.draw().is_enabled());
    assert!(!s.engine().is_locked());
    assert!(!s.record_stroke());

    s.enter(Roll::from("A"), EnterOptions::default());
    s.enable_draw().unwrap();
    assert!(s.satellite().is_on());
    assert!(s.draw().is_enabled());
    assert!(s.engine().is_locked());
    assert_eq!(s.engine().zoom(), 20.0);
    assert_eq!(s.shell().last(), Some("Draw mode ON"));
    assert!(s.record_stroke());
    assert!(s.draw().has_unsaved());

    // Dropping the satellite overlay ends draw mode.
    s.toggle_satellite(Some(false)).unwrap();
    assert!(!s.draw().is_enabled());
    assert!(!s.engine().is_locked());
}

#[test]
fn disable_draw_is_safe_when_never_enabled() {
    let mut s = stage();
    s.disable_draw();
    s.disable_draw();
    assert!(!s.draw().is_enabled());
    assert!(!s.engine().is_locked());
}

#[test]
fn changing_selection_ends_draw_mode() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.enable_draw().unwrap();
    assert!(s.record_stroke());
    s.click(IN_B);
    assert!(!s.draw().is_enabled());
    assert!(!s.draw().has_unsaved(), "sketch state belongs to the old roll");
    assert!(!s.engine().is_locked());
    assert!(s.satellite().is_on());
}

#[test]
fn exit_forgets_unsaved_sketch() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.enable_draw().unwrap();
    s.record_stroke();
    s.exit();
    assert!(!s.draw().is_enabled());
    assert!(!s.draw().has_unsaved());
}

// Re-entering the same roll keeps the sketch.
#[test]
fn reentering_same_roll_keeps_unsaved_sketch() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    s.enable_draw().unwrap();
    s.record_stroke();
    s.enter(Roll::from("A"), EnterOptions::default());
    assert!(s.draw().has_unsaved());
}

#[test]
fn click_enters_and_reclick_requests_panel() {
    let mut s = stage();
    assert_eq!(s.click(LatLng::new(5.0, 5.0)), ClickOutcome::Miss);
    assert!(s.active_roll().is_none());

    assert_eq!(s.click(IN_A), ClickOutcome::Entered(Roll::from("A")));
    assert_eq!(s.shell().last(), Some("Query stage: A (left-click)"));
    assert_eq!(s.click(IN_A), ClickOutcome::PanelRequested(Roll::from("A")));
    assert_eq!(s.scheduler().started(), 1, "re-click must not re-enter");

    assert_eq!(s.click(LatLng::new(5.0, 5.0)), ClickOutcome::Miss);
    assert_eq!(s.active_roll(), Some(&Roll::from("A")));
}

#[test]
fn address_search_enters_best_match() {
    let mut s = stage();
    let index = AddressIndex::new([
        AddressRow::new("12 Main St", "B", 0.0005, 0.0025),
        AddressRow::new("120 Main St", "A", 0.0005, 0.0005),
    ]);
    let best = s.submit_address("12 main st.", &index).unwrap();
    assert_eq!(best.row.roll, "B");
    assert_eq!(s.active_roll(), Some(&Roll::from("B")));
    assert_eq!(s.shell().last(), Some("Query stage: B (address)"));

    assert!(s.submit_address("  nowhere  ", &index).is_none());
    assert_eq!(s.shell().last(), Some("No address match for \"nowhere\"."));
    assert_eq!(s.active_roll(), Some(&Roll::from("B")));
}

#[test]
fn open_panel_is_refreshed_not_opened() {
    let mut s = stage();
    s.enter(Roll::from("A"), EnterOptions::default());
    assert!(s.shell().refreshed().is_empty());
    s.shell_mut().open_panel();
    s.click(IN_B);
    assert_eq!(s.shell().refreshed(), [Roll::from("B")]);
}

#[test]
fn record_severity_colors_inactive_parcels() {
    let mut s = QueryStage::with_records(
        HeadlessMap::default(),
        ManualScheduler::new(),
        RecordingShell::new(),
        [(Roll::from("A"), Severity::High)].into_iter().collect::<SeverityTable>(),
        registry(),
        StageConfig::default(),
    );
    s.enter(Roll::from("A"), EnterOptions::default());
    s.exit();
    let style = s.engine().style_of(&Roll::from("A")).unwrap();
    assert_eq!(style.stroke, Severity::High.color());
}
