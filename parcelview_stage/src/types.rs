// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: rolls, the selection, stage configuration, and entry options.

use core::fmt;
use core::time::Duration;

use parcelview_geom::LatLng;

/// Join identifier correlating a parcel, its zone, and any stored record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Roll(String);

impl Roll {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Roll {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Roll {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The one selection of a stage.
///
/// Holds at most one active roll, whether the query stage is active, and the
/// blink phase. The query stage is active exactly when a roll is active; the
/// blink phase is `false` whenever the stage is idle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<Roll>,
    blink_on: bool,
}

impl Selection {
    /// The active roll, if any.
    pub fn active(&self) -> Option<&Roll> {
        self.active.as_ref()
    }

    /// True if `roll` is the active roll.
    pub fn is_active(&self, roll: &Roll) -> bool {
        self.active.as_ref() == Some(roll)
    }

    /// True while the query stage is active.
    pub fn in_query_stage(&self) -> bool {
        self.active.is_some()
    }

    /// Current blink phase.
    pub fn blink_on(&self) -> bool {
        self.blink_on
    }

    /// Make `roll` active and return the previously active roll.
    pub(crate) fn activate(&mut self, roll: Roll) -> Option<Roll> {
        self.blink_on = false;
        self.active.replace(roll)
    }

    /// Clear the selection and return the roll that was active.
    pub(crate) fn clear(&mut self) -> Option<Roll> {
        self.blink_on = false;
        self.active.take()
    }

    pub(crate) fn flip_blink(&mut self) -> bool {
        if self.active.is_some() {
            self.blink_on = !self.blink_on;
        }
        self.blink_on
    }

    pub(crate) fn reset_blink(&mut self) {
        self.blink_on = false;
    }
}

/// Tunables consumed by the stage and its overlays.
///
/// Override with struct update syntax:
///
/// ```
/// use parcelview_stage::StageConfig;
/// use core::time::Duration;
///
/// let cfg = StageConfig { blink_interval: Duration::from_millis(400), ..Default::default() };
/// assert_eq!(cfg.query_zoom, 18.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    /// Satellite imagery is only shown at or above this zoom; toggling on zooms in to it.
    pub satellite_min_zoom: f64,
    /// Minimum zoom after entering the query stage.
    pub query_zoom: f64,
    /// Minimum zoom when entering centered on a point (e.g. an address).
    pub center_min_zoom: f64,
    /// Padding in pixels around the parcel when framing the viewport.
    pub fit_padding: f64,
    /// Period of the highlight blink.
    pub blink_interval: Duration,
    /// Fixed zoom used while draw mode is enabled.
    pub draw_zoom: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            satellite_min_zoom: 18.0,
            query_zoom: 18.0,
            center_min_zoom: 17.0,
            fit_padding: 24.0,
            blink_interval: Duration::from_millis(650),
            draw_zoom: 20.0,
        }
    }
}

/// Options for [`QueryStage::enter`](crate::QueryStage::enter).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnterOptions {
    /// Move the viewport here first (at no less than `center_min_zoom`).
    pub center: Option<LatLng>,
    /// Human-readable origin of the selection, e.g. `"address"` or `"left-click"`.
    pub source: Option<String>,
}

impl EnterOptions {
    /// Options carrying only a source tag.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            center: None,
            source: Some(source.into()),
        }
    }

    /// Set the point to center on.
    pub fn centered_at(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }
}

/// Result of [`QueryStage::click`](crate::QueryStage::click).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No parcel under the point; nothing changed.
    Miss,
    /// A different parcel was hit and the query stage entered it.
    Entered(Roll),
    /// The active parcel was clicked again; the host should open its detail panel.
    PanelRequested(Roll),
}
