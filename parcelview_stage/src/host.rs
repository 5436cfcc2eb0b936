// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capabilities the stage consumes from its host.
//!
//! ## Overview
//!
//! The stage never paints, schedules, or prints anything itself. It drives four
//! seams instead:
//!
//! - [`MapEngine`]: layers, viewport, projection, and parcel styling.
//! - [`Scheduler`]: repeating timers, identified by handles.
//! - [`Shell`]: the one-line status sink plus UI chrome hooks.
//! - [`RecordLookup`]: read-only severity of stored records, for styling.
//!
//! [`headless`](crate::headless) provides in-memory implementations of all four.

use core::fmt::Debug;
use core::time::Duration;

use kurbo::{Point, Rect};
use parcelview_geom::{LatLng, Ring};
use thiserror::Error;

use crate::style::{ParcelStyle, Severity, ShapeStyle};
use crate::types::Roll;

/// A failure reported by the engine while attaching a layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The surface cannot draw this kind of layer.
    #[error("layer kind `{kind}` is not supported by this surface")]
    Unsupported {
        /// Kind of the rejected layer.
        kind: &'static str,
    },
    /// The surface refused the layer for another reason.
    #[error("layer rejected: {0}")]
    Rejected(String),
}

/// A map rendering engine.
///
/// Layer handles are small copyable values owned by whoever added the layer.
/// Removing a handle that is no longer attached must be a no-op.
pub trait MapEngine {
    /// Handle of an attached layer.
    type Layer: Copy + Eq + Debug;

    /// Attach the satellite imagery base layer.
    fn add_imagery(&mut self) -> Result<Self::Layer, RenderError>;
    /// Attach a polygon: the first ring is the boundary, later rings are holes.
    fn add_polygon(&mut self, rings: &[Ring], style: &ShapeStyle)
    -> Result<Self::Layer, RenderError>;
    /// Attach a permanently visible text label.
    fn add_label(&mut self, at: LatLng, text: &str) -> Result<Self::Layer, RenderError>;
    /// Detach a layer.
    fn remove_layer(&mut self, layer: Self::Layer);
    /// True while `layer` is attached.
    fn has_layer(&self, layer: Self::Layer) -> bool;

    /// Apply a display style to a parcel feature.
    fn set_parcel_style(&mut self, roll: &Roll, style: &ParcelStyle);

    /// Current zoom.
    fn zoom(&self) -> f64;
    /// Configured maximum zoom.
    fn max_zoom(&self) -> f64;
    /// Current viewport center.
    fn center(&self) -> LatLng;
    /// Change zoom around the current center.
    fn set_zoom(&mut self, zoom: f64);
    /// Move the viewport.
    fn set_view(&mut self, center: LatLng, zoom: f64);
    /// Frame `bounds` (`x` = longitude, `y` = latitude) with `padding` pixels on each side.
    fn fit_bounds(&mut self, bounds: Rect, padding: f64);

    /// Project a geographic point to pixel space at `zoom`.
    fn project(&self, p: LatLng, zoom: f64) -> Option<Point>;
    /// World width in pixels at `zoom`.
    fn scale(&self, zoom: f64) -> Option<f64>;
    /// Geodesic area of a ring in square metres, when the engine has one.
    fn geodesic_area(&self, _ring: &[LatLng]) -> Option<f64> {
        None
    }

    /// Lock or unlock pan, zoom, keyboard, and touch navigation.
    fn set_interaction_locked(&mut self, locked: bool);
}

/// Repeating timers.
///
/// The host calls back into the stage with the handle of a task that fired;
/// the stage ignores handles it no longer owns.
pub trait Scheduler {
    /// Handle identifying a running task.
    type Handle: Copy + Eq + Debug;
    /// Start a task firing every `period`.
    fn start_repeating(&mut self, period: Duration) -> Self::Handle;
    /// Cancel a task. Cancelling an unknown or finished task is a no-op.
    fn cancel(&mut self, handle: Self::Handle);
}

/// The status line and surrounding UI chrome.
pub trait Shell {
    /// Show a human-readable status line.
    fn status(&mut self, message: &str);
    /// Close any open transient menu.
    fn dismiss_menus(&mut self) {}
    /// True if the detail panel is open.
    fn panel_open(&self) -> bool {
        false
    }
    /// Refresh the open detail panel for `roll`.
    fn refresh_panel(&mut self, _roll: &Roll) {}
}

/// Read access to stored request records.
pub trait RecordLookup {
    /// Severity of the record stored for `roll`, if any.
    fn severity(&self, roll: &Roll) -> Option<Severity>;
}

/// A record lookup with no records.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoRecords;

impl RecordLookup for NoRecords {
    #[inline]
    fn severity(&self, _roll: &Roll) -> Option<Severity> {
        None
    }
}
