// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay lifecycle: the satellite mask and the size label.
//!
//! ## Overview
//!
//! Both overlays are binary and force-settable through `toggle(force, ctx)`:
//! `Some(on)` sets the state, `None` flips it. Every toggle first tears down the
//! layers the overlay owns, so repeated calls never stack layers.
//!
//! Turning on requires an active roll. Failures revert the overlay to off, tear
//! down anything partially attached, report the error on the status line, and
//! return it. Nothing is left on the map that the overlay does not own.
//!
//! ## Automatic rebuilds
//!
//! A rebuild runs in two steps so that viewport events can keep arriving while
//! one is in flight:
//!
//! 1) `on_viewport_change` admits a rebuild for an overlay that is on but has
//!    lost its layers, and returns [`RebuildReport::Started`]. While that
//!    rebuild is in flight further triggers return [`RebuildReport::Coalesced`].
//! 2) `complete_rebuild` runs the pass. If triggers were coalesced during it,
//!    it returns [`RebuildReport::ExtraPass`] and the host completes once more;
//!    otherwise it returns [`RebuildReport::Rebuilt`]. Triggers that land during
//!    the extra pass are dropped, so a burst costs at most two passes.
//!
//! Failures on this path are logged at debug level and otherwise swallowed. A
//! failed pass detaches everything the overlay owns, imagery included, and the
//! overlay stays on; the next trigger (or a manual toggle) tries again.
//! Toggling or shutting an overlay down abandons any rebuild in flight.

use core::fmt;

use parcelview_geom::{
    GeometryError, LatLng, Rings, build_inverse_mask, estimate_area_square_meters, format_area,
    rings_from_geometry,
};
use thiserror::Error;

use crate::gate::{Admission, RebuildGate};
use crate::host::{MapEngine, RenderError, Shell};
use crate::registry::ParcelRegistry;
use crate::style::ShapeStyle;
use crate::types::{Roll, Selection, StageConfig};

/// Which overlay an error or report refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Satellite imagery revealed through the zone mask.
    Satellite,
    /// Parcel outline with an area label.
    Size,
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Satellite => "Satellite",
            Self::Size => "Size",
        })
    }
}

/// Why an overlay could not be turned on.
///
/// The `Display` text is the status line shown to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OverlayError {
    /// No parcel is selected.
    #[error("Select a parcel first.")]
    NoSelection,
    /// The active parcel has no zone; the zone and parcel datasets disagree.
    #[error("Zone not found for roll {roll} (join mismatch).")]
    ZoneNotFound {
        /// The active roll.
        roll: Roll,
    },
    /// The zone geometry could not be turned into rings.
    #[error("Zone for roll {roll}: ring extraction failed ({source}).")]
    RingExtraction {
        /// The active roll.
        roll: Roll,
        /// Underlying geometry error.
        source: GeometryError,
    },
    /// Rings were extracted but no mask could be built from them.
    #[error("Zone for roll {roll}: mask construction failed.")]
    MaskConstruction {
        /// The active roll.
        roll: Roll,
    },
    /// The active roll has no usable parcel polygon.
    #[error("No parcel polygon for roll {roll}.")]
    MissingParcel {
        /// The active roll.
        roll: Roll,
    },
    /// The engine refused a layer.
    #[error("{overlay} overlay failed for roll {roll}.")]
    Render {
        /// Overlay being built.
        overlay: OverlayKind,
        /// The active roll.
        roll: Roll,
        /// Underlying engine error.
        source: RenderError,
    },
}

/// What an automatic rebuild step did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RebuildReport {
    /// Overlay off, no selection, layers already attached, or nothing in flight.
    Ignored,
    /// A rebuild was admitted; complete it with `complete_rebuild`.
    Started,
    /// Folded into a rebuild already in flight.
    Coalesced,
    /// A pass ran and triggers arrived during it; complete once more.
    ExtraPass {
        /// The pass attached the overlay.
        built: bool,
    },
    /// The rebuild settled after `passes` passes.
    Rebuilt {
        /// Number of passes run (1 or 2).
        passes: u8,
        /// The final pass attached the overlay.
        built: bool,
    },
}

/// Everything an overlay reads or drives while building.
pub struct OverlayCtx<'a, E, H> {
    /// The stage selection.
    pub selection: &'a Selection,
    /// Parcel and zone lookup.
    pub registry: &'a ParcelRegistry,
    /// Rendering engine.
    pub engine: &'a mut E,
    /// Status sink.
    pub shell: &'a mut H,
    /// Zoom and framing tunables.
    pub config: &'a StageConfig,
}

impl<E, H> fmt::Debug for OverlayCtx<'_, E, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayCtx")
            .field("selection", self.selection)
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

/// On/off flag, owned layers, and the rebuild gate of one overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayState<L> {
    on: bool,
    layers: Vec<L>,
    gate: RebuildGate,
    passes: u8,
}

impl<L> Default for OverlayState<L> {
    fn default() -> Self {
        Self {
            on: false,
            layers: Vec::new(),
            gate: RebuildGate::default(),
            passes: 0,
        }
    }
}

impl<L: Copy + Eq> OverlayState<L> {
    /// True if the overlay is on.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Layers currently owned.
    pub fn layers(&self) -> &[L] {
        &self.layers
    }

    /// The rebuild gate.
    pub fn gate(&self) -> &RebuildGate {
        &self.gate
    }

    /// True while an automatic rebuild awaits completion.
    pub fn rebuild_in_flight(&self) -> bool {
        self.gate.in_flight()
    }

    /// Detach and forget every owned layer. Safe on an empty state.
    pub fn clear_layers<E: MapEngine<Layer = L>>(&mut self, engine: &mut E) {
        for layer in self.layers.drain(..) {
            if engine.has_layer(layer) {
                engine.remove_layer(layer);
            }
        }
    }

    fn abandon_rebuild(&mut self) {
        self.gate.reset();
        self.passes = 0;
    }

    fn begin_rebuild<E: MapEngine<Layer = L>>(
        &mut self,
        selection: &Selection,
        engine: &E,
        kind: OverlayKind,
    ) -> RebuildReport {
        if !self.on {
            return RebuildReport::Ignored;
        }
        // Handles the engine dropped on its own no longer count as present.
        self.layers.retain(|&l| engine.has_layer(l));
        if !self.layers.is_empty() || selection.active().is_none() {
            return RebuildReport::Ignored;
        }
        match self.gate.request() {
            Admission::Run => {
                self.passes = 0;
                tracing::trace!(overlay = %kind, "rebuild started");
                RebuildReport::Started
            }
            Admission::Coalesced => {
                tracing::trace!(overlay = %kind, "rebuild coalesced");
                RebuildReport::Coalesced
            }
        }
    }
}

/// Run one pass of an admitted rebuild.
///
/// `pass` builds into the owned layer list; on failure it detaches anything it
/// owns outside that list before returning the error.
fn complete_rebuild<E, H, F>(
    state: &mut OverlayState<E::Layer>,
    ctx: &mut OverlayCtx<'_, E, H>,
    kind: OverlayKind,
    pass: F,
) -> RebuildReport
where
    E: MapEngine,
    F: FnOnce(&mut Vec<E::Layer>, &Roll, &mut OverlayCtx<'_, E, H>) -> Result<(), OverlayError>,
{
    if !state.on || !state.gate.in_flight() {
        return RebuildReport::Ignored;
    }
    let Some(roll) = ctx.selection.active().cloned() else {
        state.abandon_rebuild();
        return RebuildReport::Ignored;
    };
    state.passes = state.passes.saturating_add(1);
    state.clear_layers(ctx.engine);
    let built = match pass(&mut state.layers, &roll, ctx) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(overlay = %kind, %roll, %err, "automatic rebuild failed");
            state.clear_layers(ctx.engine);
            false
        }
    };
    if state.gate.settle() {
        tracing::trace!(overlay = %kind, %roll, built, "extra rebuild pass owed");
        return RebuildReport::ExtraPass { built };
    }
    let passes = core::mem::take(&mut state.passes);
    tracing::debug!(overlay = %kind, %roll, passes, built, "overlay rebuilt");
    RebuildReport::Rebuilt { passes, built }
}

/// Report a user-facing failure on the status line and hand it back.
fn surface<H: Shell>(shell: &mut H, err: OverlayError) -> OverlayError {
    match &err {
        OverlayError::ZoneNotFound { roll } => {
            tracing::warn!(%roll, "no zone for the active parcel (join mismatch)");
        }
        other => tracing::debug!(err = %other, "overlay refused"),
    }
    shell.status(&err.to_string());
    err
}

fn off_status(kind: OverlayKind, selection: &Selection) -> String {
    let roll = selection.active().map_or("", Roll::as_str);
    format!("{kind} OFF {roll}").trim_end().to_owned()
}

/// Satellite imagery restricted to the active parcel's zone by an inverse mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SatelliteOverlay<L> {
    state: OverlayState<L>,
    imagery: Option<L>,
}

impl<L> Default for SatelliteOverlay<L> {
    fn default() -> Self {
        Self {
            state: OverlayState::default(),
            imagery: None,
        }
    }
}

impl<L: Copy + Eq> SatelliteOverlay<L> {
    /// True if the overlay is on.
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Shared overlay state.
    pub fn state(&self) -> &OverlayState<L> {
        &self.state
    }

    /// The imagery base layer, while attached by this overlay.
    pub fn imagery(&self) -> Option<L> {
        self.imagery
    }

    /// Turn the overlay on or off. `None` flips the current state.
    ///
    /// Returns the new state. Turning on requires an active roll with a zone;
    /// below `satellite_min_zoom` the viewport is zoomed in first.
    pub fn toggle<E, H>(
        &mut self,
        force: Option<bool>,
        ctx: &mut OverlayCtx<'_, E, H>,
    ) -> Result<bool, OverlayError>
    where
        E: MapEngine<Layer = L>,
        H: Shell,
    {
        let next = force.unwrap_or(!self.state.on);
        self.state.clear_layers(ctx.engine);
        self.state.abandon_rebuild();
        if !next {
            self.shutdown(ctx.engine);
            ctx.shell
                .status(&off_status(OverlayKind::Satellite, ctx.selection));
            tracing::debug!("satellite overlay off");
            return Ok(false);
        }
        let Some(roll) = ctx.selection.active().cloned() else {
            self.shutdown(ctx.engine);
            return Err(surface(ctx.shell, OverlayError::NoSelection));
        };
        let min_zoom = ctx.config.satellite_min_zoom;
        if ctx.engine.zoom() < min_zoom {
            ctx.engine.set_zoom(min_zoom);
        }
        match build_satellite(&mut self.imagery, &mut self.state.layers, &roll, ctx) {
            Ok(()) => {
                self.state.on = true;
                ctx.shell.status(&format!("Satellite ON {roll}"));
                tracing::debug!(%roll, layers = self.state.layers.len(), "satellite overlay on");
                Ok(true)
            }
            Err(err) => {
                self.shutdown(ctx.engine);
                Err(surface(ctx.shell, err))
            }
        }
    }

    /// Admit or coalesce a rebuild after a viewport change.
    pub fn on_viewport_change<E, H>(&mut self, ctx: &mut OverlayCtx<'_, E, H>) -> RebuildReport
    where
        E: MapEngine<Layer = L>,
    {
        self.state
            .begin_rebuild(ctx.selection, &*ctx.engine, OverlayKind::Satellite)
    }

    /// Run the pass of an admitted rebuild. Failures are swallowed.
    ///
    /// A failed pass also detaches the imagery, so no unmasked imagery stays
    /// on the map.
    pub fn complete_rebuild<E, H>(&mut self, ctx: &mut OverlayCtx<'_, E, H>) -> RebuildReport
    where
        E: MapEngine<Layer = L>,
    {
        let imagery = &mut self.imagery;
        complete_rebuild(
            &mut self.state,
            ctx,
            OverlayKind::Satellite,
            |layers, roll, ctx| {
                let built = build_satellite(imagery, layers, roll, ctx);
                if built.is_err() {
                    detach_imagery(imagery, ctx.engine);
                }
                built
            },
        )
    }

    /// Tear everything down and turn off without reporting. Idempotent.
    pub fn shutdown<E: MapEngine<Layer = L>>(&mut self, engine: &mut E) {
        self.state.clear_layers(engine);
        detach_imagery(&mut self.imagery, engine);
        self.state.on = false;
        self.state.abandon_rebuild();
    }
}

fn detach_imagery<E: MapEngine>(imagery: &mut Option<E::Layer>, engine: &mut E) {
    if let Some(layer) = imagery.take()
        && engine.has_layer(layer)
    {
        engine.remove_layer(layer);
    }
}

fn build_satellite<E: MapEngine, H>(
    imagery: &mut Option<E::Layer>,
    layers: &mut Vec<E::Layer>,
    roll: &Roll,
    ctx: &mut OverlayCtx<'_, E, H>,
) -> Result<(), OverlayError> {
    let zone = ctx
        .registry
        .zone(roll)
        .ok_or_else(|| OverlayError::ZoneNotFound { roll: roll.clone() })?;
    let rings = rings_from_geometry(zone).map_err(|source| OverlayError::RingExtraction {
        roll: roll.clone(),
        source,
    })?;
    let mask = build_inverse_mask(Some(zone), &rings)
        .ok_or_else(|| OverlayError::MaskConstruction { roll: roll.clone() })?;
    let render = |source| OverlayError::Render {
        overlay: OverlayKind::Satellite,
        roll: roll.clone(),
        source,
    };
    if imagery.is_none_or(|l| !ctx.engine.has_layer(l)) {
        *imagery = Some(ctx.engine.add_imagery().map_err(render)?);
    }
    layers.push(
        ctx.engine
            .add_polygon(&mask.rings(), &ShapeStyle::MASK)
            .map_err(render)?,
    );
    for poly in rings.polygons() {
        layers.push(
            ctx.engine
                .add_polygon(poly, &ShapeStyle::ZONE_OUTLINE)
                .map_err(render)?,
        );
    }
    Ok(())
}

/// Parcel outline plus a permanent label showing its area.
#[derive(Clone, Debug, PartialEq)]
pub struct SizeOverlay<L> {
    state: OverlayState<L>,
    area: Option<f64>,
}

impl<L> Default for SizeOverlay<L> {
    fn default() -> Self {
        Self {
            state: OverlayState::default(),
            area: None,
        }
    }
}

impl<L: Copy + Eq> SizeOverlay<L> {
    /// True if the overlay is on.
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    /// Shared overlay state.
    pub fn state(&self) -> &OverlayState<L> {
        &self.state
    }

    /// Area of the labelled parcel in square metres, when it could be measured.
    pub fn area_square_meters(&self) -> Option<f64> {
        self.area
    }

    /// Turn the overlay on or off. `None` flips the current state.
    pub fn toggle<E, H>(
        &mut self,
        force: Option<bool>,
        ctx: &mut OverlayCtx<'_, E, H>,
    ) -> Result<bool, OverlayError>
    where
        E: MapEngine<Layer = L>,
        H: Shell,
    {
        let next = force.unwrap_or(!self.state.on);
        self.state.clear_layers(ctx.engine);
        self.state.abandon_rebuild();
        if !next {
            self.shutdown(ctx.engine);
            ctx.shell.status(&off_status(OverlayKind::Size, ctx.selection));
            tracing::debug!("size overlay off");
            return Ok(false);
        }
        let Some(roll) = ctx.selection.active().cloned() else {
            self.shutdown(ctx.engine);
            return Err(surface(ctx.shell, OverlayError::NoSelection));
        };
        match build_size(&mut self.area, &mut self.state.layers, &roll, ctx) {
            Ok(label) => {
                self.state.on = true;
                ctx.shell.status(&format!("Size ON {roll}: {label}"));
                tracing::debug!(%roll, area = ?self.area, "size overlay on");
                Ok(true)
            }
            Err(err) => {
                self.shutdown(ctx.engine);
                Err(surface(ctx.shell, err))
            }
        }
    }

    /// Admit or coalesce a rebuild after a viewport change.
    pub fn on_viewport_change<E, H>(&mut self, ctx: &mut OverlayCtx<'_, E, H>) -> RebuildReport
    where
        E: MapEngine<Layer = L>,
    {
        self.state
            .begin_rebuild(ctx.selection, &*ctx.engine, OverlayKind::Size)
    }

    /// Run the pass of an admitted rebuild. Failures are swallowed.
    pub fn complete_rebuild<E, H>(&mut self, ctx: &mut OverlayCtx<'_, E, H>) -> RebuildReport
    where
        E: MapEngine<Layer = L>,
    {
        let area = &mut self.area;
        complete_rebuild(&mut self.state, ctx, OverlayKind::Size, |layers, roll, ctx| {
            build_size(area, layers, roll, ctx).map(drop)
        })
    }

    /// Tear everything down and turn off without reporting. Idempotent.
    pub fn shutdown<E: MapEngine<Layer = L>>(&mut self, engine: &mut E) {
        self.state.clear_layers(engine);
        self.state.on = false;
        self.state.abandon_rebuild();
        self.area = None;
    }
}

fn build_size<E: MapEngine, H>(
    area: &mut Option<f64>,
    layers: &mut Vec<E::Layer>,
    roll: &Roll,
    ctx: &mut OverlayCtx<'_, E, H>,
) -> Result<String, OverlayError> {
    let missing = || OverlayError::MissingParcel { roll: roll.clone() };
    let rings = ctx.registry.rings(roll).ok_or_else(missing)?;
    let anchor = ctx.registry.centroid(roll).ok_or_else(missing)?;
    let measured = measure_area(rings, &*ctx.engine);
    let render = |source| OverlayError::Render {
        overlay: OverlayKind::Size,
        roll: roll.clone(),
        source,
    };
    for poly in rings.polygons() {
        layers.push(
            ctx.engine
                .add_polygon(poly, &ShapeStyle::SIZE_OUTLINE)
                .map_err(render)?,
        );
    }
    let label = format_area(measured.unwrap_or(f64::NAN));
    layers.push(ctx.engine.add_label(anchor, &label).map_err(render)?);
    *area = measured;
    Ok(label)
}

/// Area of a parcel in square metres: outer rings minus their holes.
///
/// Uses the engine's geodesic area when it has one, else the planar estimate
/// projected at the engine's maximum zoom. Returns `None` if an outer ring
/// cannot be measured.
pub fn measure_area<E: MapEngine>(rings: &Rings, engine: &E) -> Option<f64> {
    let zoom = engine.max_zoom();
    let scale = engine.scale(zoom);
    let ring_area = |ring: &[LatLng]| {
        engine.geodesic_area(ring).or_else(|| {
            estimate_area_square_meters(ring, zoom, scale?, |p, z| engine.project(p, z))
        })
    };
    let mut total = 0.0;
    for poly in rings.polygons() {
        let Some((outer, holes)) = poly.split_first() else {
            continue;
        };
        let mut a = ring_area(outer)?;
        for hole in holes {
            a -= ring_area(hole).unwrap_or(0.0);
        }
        total += a.max(0.0);
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessMap, LayerKinds, RecordingShell};
    use parcelview_geom::{Geometry, Position};

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Position> {
        vec![
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0],
        ]
    }

    struct Fixture {
        selection: Selection,
        registry: ParcelRegistry,
        map: HeadlessMap,
        shell: RecordingShell,
        config: StageConfig,
    }

    impl Fixture {
        fn new(active: Option<&str>) -> Self {
            let registry = ParcelRegistry::new(
                [
                    (Roll::from("A"), Geometry::Polygon(vec![square(0.0, 0.0, 0.001)])),
                    (Roll::from("B"), Geometry::Polygon(vec![square(0.01, 0.0, 0.001)])),
                    (Roll::from("C"), Geometry::Polygon(vec![square(0.02, 0.0, 0.001)])),
                    (Roll::from("D"), Geometry::Polygon(vec![square(0.03, 0.0, 0.001)])),
                    (
                        Roll::from("R"),
                        Geometry::Polygon(vec![square(0.04, 0.0, 0.002), square(0.0405, 0.0005, 0.001)]),
                    ),
                ],
                [
                    (Roll::from("A"), Geometry::Polygon(vec![square(-0.0001, -0.0001, 0.0012)])),
                    (Roll::from("C"), Geometry::LineString(square(0.02, 0.0, 0.001))),
                    (Roll::from("D"), Geometry::Polygon(vec![vec![[0.03, 0.0], [0.031, 0.0]]])),
                ],
            );
            let mut selection = Selection::default();
            if let Some(roll) = active {
                selection.activate(Roll::from(roll));
            }
            Self {
                selection,
                registry,
                map: HeadlessMap::default(),
                shell: RecordingShell::new(),
                config: StageConfig::default(),
            }
        }

        fn ctx(&mut self) -> OverlayCtx<'_, HeadlessMap, RecordingShell> {
            OverlayCtx {
                selection: &self.selection,
                registry: &self.registry,
                engine: &mut self.map,
                shell: &mut self.shell,
                config: &self.config,
            }
        }
    }

    #[test]
    fn satellite_on_attaches_imagery_mask_and_outline() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        assert_eq!(sat.toggle(Some(true), &mut fx.ctx()), Ok(true));
        assert!(sat.is_on());
        assert_eq!(fx.map.count_of(LayerKinds::IMAGERY), 1);
        assert_eq!(fx.map.count_of(LayerKinds::POLYGON), 2);
        assert!(fx.map.zoom() >= 18.0);
        assert_eq!(fx.shell.last(), Some("Satellite ON A"));
    }

    // Forcing on twice tears down before rebuilding, so nothing stacks.
    #[test]
    fn repeated_toggle_does_not_stack_layers() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        sat.toggle(Some(true), &mut fx.ctx()).unwrap();
        sat.toggle(Some(true), &mut fx.ctx()).unwrap();
        assert_eq!(fx.map.layer_count(), 3);
        assert_eq!(sat.state().layers().len(), 2);
    }

    #[test]
    fn toggle_without_selection_is_refused() {
        let mut fx = Fixture::new(None);
        let mut sat = SatelliteOverlay::default();
        assert_eq!(sat.toggle(None, &mut fx.ctx()), Err(OverlayError::NoSelection));
        assert!(!sat.is_on());
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(fx.shell.last(), Some("Select a parcel first."));
    }

    #[test]
    fn missing_zone_reverts_to_off() {
        let mut fx = Fixture::new(Some("B"));
        let mut sat = SatelliteOverlay::default();
        let err = sat.toggle(Some(true), &mut fx.ctx()).unwrap_err();
        assert_eq!(err, OverlayError::ZoneNotFound { roll: Roll::from("B") });
        assert!(!sat.is_on());
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(fx.shell.last(), Some("Zone not found for roll B (join mismatch)."));
    }

    // Ring extraction and mask construction failures are reported differently.
    #[test]
    fn geometry_failures_are_distinguished() {
        let mut fx = Fixture::new(Some("C"));
        let mut sat = SatelliteOverlay::default();
        assert!(matches!(
            sat.toggle(Some(true), &mut fx.ctx()),
            Err(OverlayError::RingExtraction { .. })
        ));
        assert!(fx.shell.last().unwrap().contains("ring extraction failed"));

        let mut fx = Fixture::new(Some("D"));
        assert_eq!(
            sat.toggle(Some(true), &mut fx.ctx()),
            Err(OverlayError::MaskConstruction { roll: Roll::from("D") })
        );
        assert!(fx.shell.last().unwrap().contains("mask construction failed"));
        assert!(!sat.is_on());
    }

    // A refused polygon after the imagery was attached leaves nothing behind.
    #[test]
    fn render_failure_rolls_back_everything() {
        let mut fx = Fixture::new(Some("A"));
        fx.map.set_unsupported(LayerKinds::POLYGON);
        let mut sat = SatelliteOverlay::default();
        assert!(matches!(
            sat.toggle(Some(true), &mut fx.ctx()),
            Err(OverlayError::Render { overlay: OverlayKind::Satellite, .. })
        ));
        assert!(!sat.is_on());
        assert_eq!(sat.imagery(), None);
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(fx.shell.last(), Some("Satellite overlay failed for roll A."));
    }

    #[test]
    fn toggle_off_reports_roll_or_nothing() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        sat.toggle(None, &mut fx.ctx()).unwrap();
        assert_eq!(sat.toggle(None, &mut fx.ctx()), Ok(false));
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(fx.shell.last(), Some("Satellite OFF A"));

        let mut fx = Fixture::new(None);
        assert_eq!(sat.toggle(Some(false), &mut fx.ctx()), Ok(false));
        assert_eq!(fx.shell.last(), Some("Satellite OFF"));
    }

    #[test]
    fn viewport_change_rebuilds_lost_layers_once() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Ignored);
        sat.toggle(Some(true), &mut fx.ctx()).unwrap();
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Ignored);

        fx.map.clear_layers();
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Started);
        assert!(sat.state().rebuild_in_flight());
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(
            sat.complete_rebuild(&mut fx.ctx()),
            RebuildReport::Rebuilt { passes: 1, built: true }
        );
        assert_eq!(fx.map.layer_count(), 3);
        assert!(!sat.state().rebuild_in_flight());
        assert_eq!(sat.complete_rebuild(&mut fx.ctx()), RebuildReport::Ignored);
    }

    // Automatic rebuild failures stay off the status line and are retried later.
    #[test]
    fn automatic_rebuild_failure_is_swallowed() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        sat.toggle(Some(true), &mut fx.ctx()).unwrap();
        let lines = fx.shell.lines().len();

        fx.map.clear_layers();
        fx.map.set_unsupported(LayerKinds::IMAGERY);
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Started);
        assert_eq!(
            sat.complete_rebuild(&mut fx.ctx()),
            RebuildReport::Rebuilt { passes: 1, built: false }
        );
        assert!(sat.is_on());
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(fx.shell.lines().len(), lines);

        fx.map.set_unsupported(LayerKinds::empty());
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Started);
        assert_eq!(
            sat.complete_rebuild(&mut fx.ctx()),
            RebuildReport::Rebuilt { passes: 1, built: true }
        );
        assert_eq!(fx.map.layer_count(), 3);
    }

    // Imagery survives the surface dropping the mask, but a pass that cannot
    // rebuild the mask must not leave the imagery exposed.
    #[test]
    fn failed_rebuild_detaches_surviving_imagery() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        sat.toggle(Some(true), &mut fx.ctx()).unwrap();

        assert_eq!(fx.map.clear_kinds(LayerKinds::POLYGON), 2);
        assert_eq!(fx.map.count_of(LayerKinds::IMAGERY), 1);
        fx.map.set_unsupported(LayerKinds::POLYGON);
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Started);
        assert_eq!(
            sat.complete_rebuild(&mut fx.ctx()),
            RebuildReport::Rebuilt { passes: 1, built: false }
        );
        assert_eq!(fx.map.count_of(LayerKinds::IMAGERY), 0);
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(sat.imagery(), None);
        assert!(sat.is_on(), "stays on so the next trigger retries");

        fx.map.set_unsupported(LayerKinds::empty());
        sat.on_viewport_change(&mut fx.ctx());
        assert_eq!(
            sat.complete_rebuild(&mut fx.ctx()),
            RebuildReport::Rebuilt { passes: 1, built: true }
        );
        assert_eq!(fx.map.count_of(LayerKinds::IMAGERY), 1);
        assert_eq!(fx.map.count_of(LayerKinds::POLYGON), 2);
    }

    // Triggers during the first pass buy one extra pass; triggers during that
    // extra pass are dropped.
    #[test]
    fn burst_of_triggers_costs_two_passes() {
        let mut fx = Fixture::new(Some("A"));
        let mut size = SizeOverlay::default();
        size.toggle(Some(true), &mut fx.ctx()).unwrap();
        fx.map.clear_layers();

        assert_eq!(size.on_viewport_change(&mut fx.ctx()), RebuildReport::Started);
        for _ in 0..50 {
            assert_eq!(size.on_viewport_change(&mut fx.ctx()), RebuildReport::Coalesced);
        }
        assert_eq!(
            size.complete_rebuild(&mut fx.ctx()),
            RebuildReport::ExtraPass { built: true }
        );
        assert!(size.state().rebuild_in_flight());
        // The surface drops the layers again while the extra pass is owed.
        fx.map.clear_layers();
        for _ in 0..50 {
            assert_eq!(size.on_viewport_change(&mut fx.ctx()), RebuildReport::Coalesced);
        }
        assert_eq!(
            size.complete_rebuild(&mut fx.ctx()),
            RebuildReport::Rebuilt { passes: 2, built: true }
        );
        assert!(!size.state().rebuild_in_flight());
        assert_eq!(fx.map.layer_count(), 2);
        assert_eq!(size.on_viewport_change(&mut fx.ctx()), RebuildReport::Ignored);
    }

    #[test]
    fn toggle_abandons_rebuild_in_flight() {
        let mut fx = Fixture::new(Some("A"));
        let mut sat = SatelliteOverlay::default();
        sat.toggle(Some(true), &mut fx.ctx()).unwrap();
        fx.map.clear_layers();
        assert_eq!(sat.on_viewport_change(&mut fx.ctx()), RebuildReport::Started);

        sat.toggle(Some(false), &mut fx.ctx()).unwrap();
        assert!(!sat.state().rebuild_in_flight());
        assert_eq!(sat.complete_rebuild(&mut fx.ctx()), RebuildReport::Ignored);
        assert_eq!(fx.map.layer_count(), 0);
    }

    #[test]
    fn size_overlay_labels_area_at_centroid() {
        let mut fx = Fixture::new(Some("A"));
        let mut size = SizeOverlay::default();
        assert_eq!(size.toggle(Some(true), &mut fx.ctx()), Ok(true));
        let area = size.area_square_meters().unwrap();
        // 0.001° at the equator is about 111.32 m.
        assert!((area - 12_392.0).abs() < 50.0, "area {area}");
        let label = format_area(area);
        assert!(label.ends_with("acres"), "label {label}");
        assert_eq!(fx.map.labels(), vec![label.as_str()]);
        assert_eq!(fx.map.count_of(LayerKinds::POLYGON), 1);
        assert_eq!(fx.shell.last(), Some(format!("Size ON A: {label}").as_str()));

        assert_eq!(size.toggle(None, &mut fx.ctx()), Ok(false));
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(size.area_square_meters(), None);
        assert_eq!(fx.shell.last(), Some("Size OFF A"));
    }

    #[test]
    fn size_overlay_rolls_back_when_label_is_refused() {
        let mut fx = Fixture::new(Some("A"));
        fx.map.set_unsupported(LayerKinds::LABEL);
        let mut size = SizeOverlay::default();
        assert!(matches!(
            size.toggle(Some(true), &mut fx.ctx()),
            Err(OverlayError::Render { overlay: OverlayKind::Size, .. })
        ));
        assert!(!size.is_on());
        assert_eq!(fx.map.layer_count(), 0);
        assert_eq!(fx.shell.last(), Some("Size overlay failed for roll A."));
    }

    #[test]
    fn size_overlay_needs_a_parcel_polygon() {
        let mut fx = Fixture::new(Some("ghost"));
        let mut size = SizeOverlay::default();
        assert_eq!(
            size.toggle(Some(true), &mut fx.ctx()),
            Err(OverlayError::MissingParcel { roll: Roll::from("ghost") })
        );
        assert_eq!(fx.shell.last(), Some("No parcel polygon for roll ghost."));
    }

    // The hole is a quarter of the outer square.
    #[test]
    fn measured_area_subtracts_holes() {
        let fx = Fixture::new(None);
        let rings = fx.registry.rings(&Roll::from("R")).unwrap();
        let area = measure_area(rings, &fx.map).unwrap();
        assert!((area - 3.0 * 12_392.0).abs() < 150.0, "area {area}");
    }
}
