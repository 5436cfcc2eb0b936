// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The query stage state machine.
//!
//! ## Overview
//!
//! A [`QueryStage`] is Idle or Active(roll). It owns the one [`Selection`], the
//! blink task, both overlays, and draw mode, and drives them against the host
//! capabilities it was built with.
//!
//! ## Entering
//!
//! [`QueryStage::enter`] dismisses menus, makes the roll active, restyles the
//! previous and new rolls, optionally centers on a point, frames the parcel,
//! raises the zoom to `query_zoom` (never lowering it), and restarts the blink.
//! When the roll changes, draw mode ends and overlays that are on are rebuilt
//! for the new roll. The roll and its source are reported last, so the query
//! stage line is the final status after any overlay messages.
//!
//! ## Exiting
//!
//! [`QueryStage::exit`] stops the blink, ends draw mode (dropping unsaved sketch
//! state), and turns both overlays off while the outgoing roll is still
//! selected. Only then is the selection cleared and the old roll restyled.
//! Calling it again is harmless.
//!
//! ## Blink
//!
//! The host calls [`QueryStage::on_blink_tick`] with the handle of each timer
//! that fires. Only the live handle flips the phase, and only the active parcel
//! is restyled.

use core::fmt;

use parcelview_geom::LatLng;
use parcelview_search::{AddressIndex, Ranked};

use crate::blink::RepeatingTask;
use crate::draw::{DrawError, DrawMode};
use crate::host::{MapEngine, NoRecords, RecordLookup, Scheduler, Shell};
use crate::overlay::{
    OverlayCtx, OverlayError, RebuildReport, SatelliteOverlay, SizeOverlay,
};
use crate::registry::ParcelRegistry;
use crate::style::parcel_style;
use crate::types::{ClickOutcome, EnterOptions, Roll, Selection, StageConfig};

/// What each overlay did with a viewport change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ViewportReport {
    /// Satellite overlay outcome.
    pub satellite: RebuildReport,
    /// Size overlay outcome.
    pub size: RebuildReport,
}

struct Parts<'a, L> {
    satellite: &'a mut SatelliteOverlay<L>,
    size: &'a mut SizeOverlay<L>,
    draw: &'a mut DrawMode,
}

/// Single-selection query stage over a map engine.
///
/// ## Usage
///
/// - Build a [`ParcelRegistry`] from parcel and zone geometry.
/// - Construct with [`QueryStage::new`], or [`QueryStage::with_records`] to
///   color parcels by stored record severity.
/// - Forward host events: clicks to [`QueryStage::click`], fired timers to
///   [`QueryStage::on_blink_tick`], and zoom or move ends to
///   [`QueryStage::on_viewport_change`]. Complete admitted overlay rebuilds
///   with [`QueryStage::complete_rebuilds`], e.g. on the next frame.
///
/// ```
/// use parcelview_geom::{Geometry, LatLng};
/// use parcelview_stage::headless::{HeadlessMap, ManualScheduler, RecordingShell};
/// use parcelview_stage::{ClickOutcome, ParcelRegistry, QueryStage, Roll, StageConfig};
///
/// let lot = vec![[0.0, 0.0], [0.001, 0.0], [0.001, 0.001], [0.0, 0.001], [0.0, 0.0]];
/// let registry = ParcelRegistry::new([(Roll::from("101"), Geometry::Polygon(vec![lot]))], []);
/// let mut stage = QueryStage::new(
///     HeadlessMap::default(),
///     ManualScheduler::new(),
///     RecordingShell::new(),
///     registry,
///     StageConfig::default(),
/// );
///
/// let hit = stage.click(LatLng::new(0.0005, 0.0005));
/// assert_eq!(hit, ClickOutcome::Entered(Roll::from("101")));
/// assert_eq!(stage.shell().last(), Some("Query stage: 101 (left-click)"));
///
/// stage.exit();
/// assert!(stage.active_roll().is_none());
/// assert_eq!(stage.shell().last(), Some("Ready."));
/// ```
pub struct QueryStage<E: MapEngine, S: Scheduler, H: Shell, R: RecordLookup = NoRecords> {
    engine: E,
    scheduler: S,
    shell: H,
    records: R,
    registry: ParcelRegistry,
    config: StageConfig,
    selection: Selection,
    blink: RepeatingTask<S::Handle>,
    satellite: SatelliteOverlay<E::Layer>,
    size: SizeOverlay<E::Layer>,
    draw: DrawMode,
}

impl<E, S, H, R> fmt::Debug for QueryStage<E, S, H, R>
where
    E: MapEngine,
    S: Scheduler,
    H: Shell,
    R: RecordLookup,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryStage")
            .field("selection", &self.selection)
            .field("blink", &self.blink)
            .field("satellite", &self.satellite.is_on())
            .field("size", &self.size.is_on())
            .field("draw", &self.draw)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<E: MapEngine, S: Scheduler, H: Shell> QueryStage<E, S, H, NoRecords> {
    /// Create an idle stage with no record lookup.
    pub fn new(
        engine: E,
        scheduler: S,
        shell: H,
        registry: ParcelRegistry,
        config: StageConfig,
    ) -> Self {
        Self::with_records(engine, scheduler, shell, NoRecords, registry, config)
    }
}

impl<E, S, H, R> QueryStage<E, S, H, R>
where
    E: MapEngine,
    S: Scheduler,
    H: Shell,
    R: RecordLookup,
{
    /// Create an idle stage that styles parcels from `records`.
    pub fn with_records(
        engine: E,
        scheduler: S,
        shell: H,
        records: R,
        registry: ParcelRegistry,
        config: StageConfig,
    ) -> Self {
        Self {
            engine,
            scheduler,
            shell,
            records,
            registry,
            config,
            selection: Selection::default(),
            blink: RepeatingTask::new(),
            satellite: SatelliteOverlay::default(),
            size: SizeOverlay::default(),
            draw: DrawMode::default(),
        }
    }

    fn split(&mut self) -> (OverlayCtx<'_, E, H>, Parts<'_, E::Layer>) {
        (
            OverlayCtx {
                selection: &self.selection,
                registry: &self.registry,
                engine: &mut self.engine,
                shell: &mut self.shell,
                config: &self.config,
            },
            Parts {
                satellite: &mut self.satellite,
                size: &mut self.size,
                draw: &mut self.draw,
            },
        )
    }

    fn restyle(&mut self, roll: &Roll) {
        let style = parcel_style(roll, &self.selection, self.records.severity(roll));
        self.engine.set_parcel_style(roll, &style);
    }

    /// Enter the query stage for `roll`.
    ///
    /// Re-entering the active roll reframes it and restarts the blink; the
    /// stage still holds exactly one live timer.
    pub fn enter(&mut self, roll: Roll, options: EnterOptions) {
        self.shell.dismiss_menus();
        let previous = self.selection.activate(roll.clone());
        let changed = previous.as_ref() != Some(&roll);
        if let Some(prev) = previous.as_ref().filter(|_| changed) {
            self.restyle(prev);
        }
        self.restyle(&roll);

        if let Some(center) = options.center.filter(|c| c.is_finite()) {
            let zoom = self.engine.zoom().max(self.config.center_min_zoom);
            self.engine.set_view(center, zoom);
        }
        if let Some(bounds) = self.registry.bounds(&roll) {
            self.engine.fit_bounds(bounds, self.config.fit_padding);
        }
        if self.engine.zoom() < self.config.query_zoom {
            self.engine.set_zoom(self.config.query_zoom);
        }

        let timer = self
            .blink
            .start(&mut self.scheduler, self.config.blink_interval);
        tracing::debug!(%roll, ?previous, ?timer, "entered query stage");

        if changed {
            let (mut ctx, parts) = self.split();
            parts.draw.reset(ctx.engine);
            // Overlays follow the selection; a failure leaves them off and is
            // already on the status line.
            if parts.satellite.is_on() {
                let _ = parts.satellite.toggle(Some(true), &mut ctx);
            }
            if parts.size.is_on() {
                let _ = parts.size.toggle(Some(true), &mut ctx);
            }
        }

        let status = match options.source.as_deref() {
            Some(source) => format!("Query stage: {roll} ({source})"),
            None => format!("Query stage: {roll}"),
        };
        self.shell.status(&status);
        if self.shell.panel_open() {
            self.shell.refresh_panel(&roll);
        }
    }

    /// Leave the query stage. Safe to call when idle.
    pub fn exit(&mut self) {
        if self.blink.is_running() {
            tracing::debug!("blink stopped");
        }
        self.blink.stop(&mut self.scheduler);
        self.selection.reset_blink();

        {
            let (mut ctx, parts) = self.split();
            parts.draw.reset(ctx.engine);
            if parts.satellite.is_on() {
                let _ = parts.satellite.toggle(Some(false), &mut ctx);
            } else {
                parts.satellite.shutdown(ctx.engine);
            }
            if parts.size.is_on() {
                let _ = parts.size.toggle(Some(false), &mut ctx);
            } else {
                parts.size.shutdown(ctx.engine);
            }
        }

        if let Some(roll) = self.selection.clear() {
            self.restyle(&roll);
            tracing::debug!(%roll, "left query stage");
        }
        self.shell.status("Ready.");
    }

    /// Handle a fired blink timer. Returns `true` if the phase flipped.
    pub fn on_blink_tick(&mut self, handle: S::Handle) -> bool {
        if !self.blink.is_current(handle) {
            return false;
        }
        let Some(roll) = self.selection.active().cloned() else {
            self.blink.stop(&mut self.scheduler);
            return false;
        };
        self.selection.flip_blink();
        self.restyle(&roll);
        true
    }

    /// Admit rebuilds for overlays that lost their layers after a zoom or move.
    ///
    /// Admitted rebuilds run when the host calls
    /// [`QueryStage::complete_rebuilds`]; triggers arriving before then are
    /// coalesced.
    pub fn on_viewport_change(&mut self) -> ViewportReport {
        let (mut ctx, parts) = self.split();
        ViewportReport {
            satellite: parts.satellite.on_viewport_change(&mut ctx),
            size: parts.size.on_viewport_change(&mut ctx),
        }
    }

    /// Run the pending pass of every rebuild in flight.
    ///
    /// Call again while either overlay reports [`RebuildReport::ExtraPass`], or
    /// loop on [`QueryStage::rebuild_in_flight`].
    pub fn complete_rebuilds(&mut self) -> ViewportReport {
        let (mut ctx, parts) = self.split();
        ViewportReport {
            satellite: parts.satellite.complete_rebuild(&mut ctx),
            size: parts.size.complete_rebuild(&mut ctx),
        }
    }

    /// True while either overlay has a rebuild awaiting completion.
    pub fn rebuild_in_flight(&self) -> bool {
        self.satellite.state().rebuild_in_flight() || self.size.state().rebuild_in_flight()
    }

    /// Turn the satellite overlay on or off (`None` flips it).
    ///
    /// Draw mode ends whenever the overlay ends up off.
    pub fn toggle_satellite(&mut self, force: Option<bool>) -> Result<bool, OverlayError> {
        let (mut ctx, parts) = self.split();
        let result = parts.satellite.toggle(force, &mut ctx);
        if !parts.satellite.is_on() && parts.draw.is_enabled() {
            parts.draw.disable(ctx.engine);
        }
        result
    }

    /// Turn the size overlay on or off (`None` flips it).
    pub fn toggle_size(&mut self, force: Option<bool>) -> Result<bool, OverlayError> {
        let (mut ctx, parts) = self.split();
        parts.size.toggle(force, &mut ctx)
    }

    /// Enable draw mode, turning the satellite overlay on if needed.
    pub fn enable_draw(&mut self) -> Result<(), DrawError> {
        let (mut ctx, parts) = self.split();
        parts.draw.enable(parts.satellite, &mut ctx)
    }

    /// Disable draw mode and unlock navigation. Safe to call at any time.
    pub fn disable_draw(&mut self) {
        self.draw.disable(&mut self.engine);
    }

    /// Note a finished sketch stroke. Returns `false` unless draw mode is on.
    pub fn record_stroke(&mut self) -> bool {
        self.draw.mark_stroke()
    }

    /// Forget unsaved sketch work after the host saved or discarded it.
    pub fn clear_unsaved_drawing(&mut self) {
        self.draw.clear_unsaved();
    }

    /// Select the parcel under `at`.
    ///
    /// Clicking the active parcel again does not re-enter; it asks the host to
    /// open the detail panel instead.
    pub fn click(&mut self, at: LatLng) -> ClickOutcome {
        let Some(roll) = self.registry.hit_test(at) else {
            return ClickOutcome::Miss;
        };
        if self.selection.is_active(&roll) {
            tracing::debug!(%roll, "re-click on the active parcel");
            return ClickOutcome::PanelRequested(roll);
        }
        self.enter(roll.clone(), EnterOptions::from_source("left-click"));
        ClickOutcome::Entered(roll)
    }

    /// Enter the best address match for `query`, centered on its address point.
    pub fn submit_address<'i>(
        &mut self,
        query: &str,
        index: &'i AddressIndex,
    ) -> Option<Ranked<'i>> {
        let Some(best) = index.best(query) else {
            self.shell
                .status(&format!("No address match for \"{}\".", query.trim()));
            return None;
        };
        let mut options = EnterOptions::from_source("address");
        let point = LatLng::new(best.row.lat, best.row.lng);
        if point.is_finite() {
            options = options.centered_at(point);
        }
        self.enter(Roll::new(best.row.roll.as_str()), options);
        Some(best)
    }

    /// The active roll, if any.
    pub fn active_roll(&self) -> Option<&Roll> {
        self.selection.active()
    }

    /// The selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The parcel registry.
    pub fn registry(&self) -> &ParcelRegistry {
        &self.registry
    }

    /// Stage configuration.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// The satellite overlay.
    pub fn satellite(&self) -> &SatelliteOverlay<E::Layer> {
        &self.satellite
    }

    /// The size overlay.
    pub fn size(&self) -> &SizeOverlay<E::Layer> {
        &self.size
    }

    /// Draw mode flags.
    pub fn draw(&self) -> &DrawMode {
        &self.draw
    }

    /// Handle of the live blink timer.
    pub fn blink_handle(&self) -> Option<S::Handle> {
        self.blink.handle()
    }

    /// The map engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The map engine, mutably.
    ///
    /// Removing layers owned by an overlay is allowed; the next viewport change
    /// rebuilds them.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The scheduler, mutably (e.g. to advance a virtual clock).
    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// The shell.
    pub fn shell(&self) -> &H {
        &self.shell
    }

    /// The shell, mutably.
    pub fn shell_mut(&mut self) -> &mut H {
        &mut self.shell
    }

    /// The record lookup.
    pub fn records(&self) -> &R {
        &self.records
    }
}
