// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host implementations.
//!
//! ## Overview
//!
//! - [`HeadlessMap`]: a [`MapEngine`] that keeps layers in a slot table with
//!   generational [`LayerId`]s, tracks the viewport, and projects with
//!   spherical Web Mercator (a 256 px tile at zoom 0).
//! - [`ManualScheduler`]: a [`Scheduler`] driven by [`ManualScheduler::advance`].
//! - [`RecordingShell`]: a [`Shell`] that remembers every status line.
//! - [`SeverityTable`]: a [`RecordLookup`] backed by a map.
//!
//! These back the demos and tests, and can stand in for a real surface in
//! batch tools. Individual layer kinds can be disabled with
//! [`HeadlessMap::set_unsupported`] to exercise failure paths.

use core::f64::consts::PI;
use core::fmt;
use core::time::Duration;
use std::collections::BTreeMap;

use kurbo::{Point, Rect};
use parcelview_geom::{LatLng, Ring};

use crate::host::{MapEngine, RecordLookup, RenderError, Scheduler, Shell};
use crate::style::{ParcelStyle, Severity, ShapeStyle};
use crate::types::Roll;

/// Pixel size of the world at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// Identifier of a layer on a [`HeadlessMap`].
///
/// A slot index plus a generation, so a handle to a removed layer never aliases
/// a later layer that reuses the slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u32, u32);

impl LayerId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Kinds of layer a surface can draw.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerKinds: u8 {
        /// Raster imagery.
        const IMAGERY = 0b0000_0001;
        /// Vector polygons.
        const POLYGON = 0b0000_0010;
        /// Text labels.
        const LABEL   = 0b0000_0100;
    }
}

/// A layer attached to a [`HeadlessMap`].
#[derive(Clone, Debug, PartialEq)]
pub enum HeadlessLayer {
    /// Satellite imagery.
    Imagery,
    /// A polygon and its style.
    Polygon {
        /// Boundary followed by holes.
        rings: Vec<Ring>,
        /// Display style.
        style: ShapeStyle,
    },
    /// A text label.
    Label {
        /// Anchor point.
        at: LatLng,
        /// Label text.
        text: String,
    },
}

impl HeadlessLayer {
    /// The kind of this layer.
    pub fn kind(&self) -> LayerKinds {
        match self {
            Self::Imagery => LayerKinds::IMAGERY,
            Self::Polygon { .. } => LayerKinds::POLYGON,
            Self::Label { .. } => LayerKinds::LABEL,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    layer: HeadlessLayer,
}

/// A map engine with no surface.
#[derive(Clone)]
pub struct HeadlessMap {
    slots: Vec<Option<Slot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    unsupported: LayerKinds,
    viewport: (f64, f64),
    center: LatLng,
    zoom: f64,
    max_zoom: f64,
    locked: bool,
    styles: BTreeMap<Roll, ParcelStyle>,
    restyled: Vec<Roll>,
}

impl fmt::Debug for HeadlessMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessMap")
            .field("layers", &self.layer_count())
            .field("center", &self.center)
            .field("zoom", &self.zoom)
            .field("max_zoom", &self.max_zoom)
            .field("locked", &self.locked)
            .field("unsupported", &self.unsupported)
            .finish_non_exhaustive()
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

impl HeadlessMap {
    /// A map with a `width` × `height` pixel viewport at zoom 12 over (0, 0).
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            unsupported: LayerKinds::empty(),
            viewport: (width.max(1.0), height.max(1.0)),
            center: LatLng::new(0.0, 0.0),
            zoom: 12.0,
            max_zoom: 20.0,
            locked: false,
            styles: BTreeMap::new(),
            restyled: Vec::new(),
        }
    }

    /// Make later attempts to add layers of `kinds` fail.
    pub fn set_unsupported(&mut self, kinds: LayerKinds) {
        self.unsupported = kinds;
    }

    /// Change the maximum zoom, clamping the current zoom to it.
    pub fn set_max_zoom(&mut self, max_zoom: f64) {
        self.max_zoom = max_zoom.max(0.0);
        self.zoom = self.zoom.min(self.max_zoom);
    }

    /// All attached layers in slot order.
    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &HeadlessLayer)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let slot = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slot count never exceeds u32::MAX; see `alloc`."
            )]
            Some((LayerId(i as u32, slot.generation), &slot.layer))
        })
    }

    /// The layer behind `id`, if still attached.
    pub fn layer(&self, id: LayerId) -> Option<&HeadlessLayer> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|s| s.generation == id.1)
            .map(|s| &s.layer)
    }

    /// Number of attached layers.
    pub fn layer_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Number of attached layers of any of `kinds`.
    pub fn count_of(&self, kinds: LayerKinds) -> usize {
        self.layers().filter(|(_, l)| kinds.contains(l.kind())).count()
    }

    /// Text of every attached label.
    pub fn labels(&self) -> Vec<&str> {
        self.layers()
            .filter_map(|(_, l)| match l {
                HeadlessLayer::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Last style applied to `roll`.
    pub fn style_of(&self, roll: &Roll) -> Option<&ParcelStyle> {
        self.styles.get(roll)
    }

    /// Drain the log of rolls restyled since the last call.
    pub fn take_restyled(&mut self) -> Vec<Roll> {
        core::mem::take(&mut self.restyled)
    }

    /// True while navigation is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Remove every layer, as a surface reset would.
    pub fn clear_layers(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(i);
            }
        }
    }

    /// Remove every layer of any of `kinds`. Returns how many were removed.
    pub fn clear_kinds(&mut self, kinds: LayerKinds) -> usize {
        let mut removed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|s| kinds.contains(s.layer.kind())) {
                *slot = None;
                self.free_list.push(i);
                removed += 1;
            }
        }
        removed
    }

    fn alloc(&mut self, layer: HeadlessLayer) -> Result<LayerId, RenderError> {
        let kind = layer.kind();
        if self.unsupported.intersects(kind) {
            return Err(RenderError::Unsupported {
                kind: kind_name(kind),
            });
        }
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].saturating_add(1);
            idx
        } else {
            if u32::try_from(self.slots.len()).is_err() {
                return Err(RenderError::Rejected("layer table is full".into()));
            }
            self.slots.push(None);
            self.generations.push(1);
            self.slots.len() - 1
        };
        let generation = self.generations[idx];
        self.slots[idx] = Some(Slot { generation, layer });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Checked against u32::MAX before pushing."
        )]
        Ok(LayerId(idx as u32, generation))
    }
}

fn kind_name(kind: LayerKinds) -> &'static str {
    if kind == LayerKinds::IMAGERY {
        "imagery"
    } else if kind == LayerKinds::POLYGON {
        "polygon"
    } else {
        "label"
    }
}

/// World width in pixels at `zoom`.
fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

impl MapEngine for HeadlessMap {
    type Layer = LayerId;

    fn add_imagery(&mut self) -> Result<LayerId, RenderError> {
        self.alloc(HeadlessLayer::Imagery)
    }

    fn add_polygon(&mut self, rings: &[Ring], style: &ShapeStyle) -> Result<LayerId, RenderError> {
        if rings.is_empty() {
            return Err(RenderError::Rejected("polygon has no rings".into()));
        }
        self.alloc(HeadlessLayer::Polygon {
            rings: rings.to_vec(),
            style: *style,
        })
    }

    fn add_label(&mut self, at: LatLng, text: &str) -> Result<LayerId, RenderError> {
        self.alloc(HeadlessLayer::Label {
            at,
            text: text.to_owned(),
        })
    }

    fn remove_layer(&mut self, layer: LayerId) {
        if self.layer(layer).is_some() {
            self.slots[layer.idx()] = None;
            self.free_list.push(layer.idx());
        }
    }

    fn has_layer(&self, layer: LayerId) -> bool {
        self.layer(layer).is_some()
    }

    fn set_parcel_style(&mut self, roll: &Roll, style: &ParcelStyle) {
        self.styles.insert(roll.clone(), *style);
        self.restyled.push(roll.clone());
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    fn center(&self) -> LatLng {
        self.center
    }

    fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(0.0, self.max_zoom);
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        if center.is_finite() {
            self.center = center;
        }
        self.set_zoom(zoom);
    }

    fn fit_bounds(&mut self, bounds: Rect, padding: f64) {
        let sw = LatLng::new(bounds.y0, bounds.x0);
        let ne = LatLng::new(bounds.y1, bounds.x1);
        let (Some(a), Some(b)) = (self.project(sw, 0.0), self.project(ne, 0.0)) else {
            return;
        };
        let span_x = (b.x - a.x).abs();
        let span_y = (b.y - a.y).abs();
        let avail_x = (self.viewport.0 - 2.0 * padding).max(1.0);
        let avail_y = (self.viewport.1 - 2.0 * padding).max(1.0);
        let fit = (avail_x / span_x).min(avail_y / span_y);
        // Zoom snaps down to whole levels; a degenerate box fits at any zoom.
        let zoom = if fit.is_finite() {
            fit.log2().floor()
        } else {
            self.max_zoom
        };
        let c = bounds.center();
        self.set_view(LatLng::new(c.y, c.x), zoom);
    }

    fn project(&self, p: LatLng, zoom: f64) -> Option<Point> {
        if !p.is_finite() || !zoom.is_finite() {
            return None;
        }
        let size = world_size(zoom);
        let lat = p.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let x = (p.lng + 180.0) / 360.0 * size;
        let y = (0.5 - lat.tan().asinh() / (2.0 * PI)) * size;
        Some(Point::new(x, y))
    }

    fn scale(&self, zoom: f64) -> Option<f64> {
        zoom.is_finite().then(|| world_size(zoom))
    }

    fn set_interaction_locked(&mut self, locked: bool) {
        self.locked = locked;
    }
}

/// Identifier of a task on a [`ManualScheduler`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Clone, Debug)]
struct Task {
    period: Duration,
    due: Duration,
}

/// A scheduler whose clock only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next: u64,
    started: usize,
    tasks: BTreeMap<TaskId, Task>,
}

impl ManualScheduler {
    /// A scheduler at time zero with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tasks.
    pub fn live(&self) -> usize {
        self.tasks.len()
    }

    /// Number of tasks ever started.
    pub fn started(&self) -> usize {
        self.started
    }

    /// True if `id` is live.
    pub fn is_live(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Move the clock forward and return the tasks that fired, in firing order.
    ///
    /// A task that is due several times in the window appears several times.
    pub fn advance(&mut self, by: Duration) -> Vec<TaskId> {
        let target = self.now.saturating_add(by);
        let mut fired = Vec::new();
        for (&id, task) in &mut self.tasks {
            while task.due <= target {
                fired.push((task.due, id));
                task.due += task.period;
            }
        }
        fired.sort_unstable();
        self.now = target;
        fired.into_iter().map(|(_, id)| id).collect()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = TaskId;

    fn start_repeating(&mut self, period: Duration) -> TaskId {
        let period = period.max(Duration::from_millis(1));
        let id = TaskId(self.next);
        self.next += 1;
        self.started += 1;
        self.tasks.insert(
            id,
            Task {
                period,
                due: self.now + period,
            },
        );
        id
    }

    fn cancel(&mut self, handle: TaskId) {
        self.tasks.remove(&handle);
    }
}

/// A shell that records what it was asked to show.
#[derive(Clone, Debug, Default)]
pub struct RecordingShell {
    lines: Vec<String>,
    panel_open: bool,
    refreshed: Vec<Roll>,
    menus_dismissed: usize,
}

impl RecordingShell {
    /// An empty shell with the panel closed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every status line, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The latest status line.
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Open the detail panel.
    pub fn open_panel(&mut self) {
        self.panel_open = true;
    }

    /// Close the detail panel.
    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    /// Rolls the panel was refreshed for, oldest first.
    pub fn refreshed(&self) -> &[Roll] {
        &self.refreshed
    }

    /// How many times menus were dismissed.
    pub fn menus_dismissed(&self) -> usize {
        self.menus_dismissed
    }
}

impl Shell for RecordingShell {
    fn status(&mut self, message: &str) {
        tracing::trace!(message, "status");
        self.lines.push(message.to_owned());
    }

    fn dismiss_menus(&mut self) {
        self.menus_dismissed += 1;
    }

    fn panel_open(&self) -> bool {
        self.panel_open
    }

    fn refresh_panel(&mut self, roll: &Roll) {
        self.refreshed.push(roll.clone());
    }
}

/// Record severities keyed by roll.
#[derive(Clone, Debug, Default)]
pub struct SeverityTable {
    map: BTreeMap<Roll, Severity>,
}

impl SeverityTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a severity, returning the previous one.
    pub fn insert(&mut self, roll: Roll, severity: Severity) -> Option<Severity> {
        self.map.insert(roll, severity)
    }

    /// Forget the record for `roll`.
    pub fn remove(&mut self, roll: &Roll) -> Option<Severity> {
        self.map.remove(roll)
    }
}

impl FromIterator<(Roll, Severity)> for SeverityTable {
    fn from_iter<I: IntoIterator<Item = (Roll, Severity)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl RecordLookup for SeverityTable {
    fn severity(&self, roll: &Roll) -> Option<Severity> {
        self.map.get(roll).copied()
    }
}
