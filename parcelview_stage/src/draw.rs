// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw mode: a locked, zoomed-in view over satellite imagery for sketching.
//!
//! Enabling draw mode needs the satellite overlay. If it is off, it is turned on
//! first; if that fails, draw mode stays disabled. While enabled the viewport is
//! centered on the parcel at a fixed zoom and navigation is locked. Disabling
//! always unlocks navigation, even when draw mode was not enabled.
//!
//! Sketch strokes themselves belong to the host; the stage only tracks whether
//! there is unsaved work for the active parcel. Leaving the stage or selecting
//! another parcel forgets it.

use thiserror::Error;

use crate::host::{MapEngine, Shell};
use crate::overlay::{OverlayCtx, OverlayError, SatelliteOverlay};

/// Why draw mode could not be enabled.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    /// The satellite overlay was off and could not be turned on.
    #[error("draw mode needs the satellite overlay: {0}")]
    SatelliteUnavailable(#[source] OverlayError),
}

/// Draw mode flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawMode {
    enabled: bool,
    unsaved: bool,
}

impl DrawMode {
    /// True while draw mode is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True if strokes were recorded since the last save or clear.
    pub fn has_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Enable draw mode for the active roll.
    pub fn enable<E, H>(
        &mut self,
        satellite: &mut SatelliteOverlay<E::Layer>,
        ctx: &mut OverlayCtx<'_, E, H>,
    ) -> Result<(), DrawError>
    where
        E: MapEngine,
        H: Shell,
    {
        if !satellite.is_on() {
            satellite
                .toggle(Some(true), ctx)
                .map_err(DrawError::SatelliteUnavailable)?;
        }
        let center = ctx
            .selection
            .active()
            .and_then(|roll| ctx.registry.centroid(roll))
            .unwrap_or_else(|| ctx.engine.center());
        let zoom = ctx.config.draw_zoom.min(ctx.engine.max_zoom());
        ctx.engine.set_interaction_locked(true);
        ctx.engine.set_view(center, zoom);
        self.enabled = true;
        ctx.shell.status("Draw mode ON");
        tracing::debug!(zoom, "draw mode enabled");
        Ok(())
    }

    /// Disable draw mode and unlock navigation. Idempotent.
    pub fn disable<E: MapEngine>(&mut self, engine: &mut E) {
        engine.set_interaction_locked(false);
        if self.enabled {
            self.enabled = false;
            tracing::debug!("draw mode disabled");
        }
    }

    /// Disable draw mode and drop the unsaved flag, for when the sketch's
    /// parcel is no longer selected.
    pub fn reset<E: MapEngine>(&mut self, engine: &mut E) {
        self.disable(engine);
        self.unsaved = false;
    }

    /// Note a finished stroke. Ignored unless draw mode is enabled.
    pub fn mark_stroke(&mut self) -> bool {
        if self.enabled {
            self.unsaved = true;
        }
        self.enabled
    }

    /// Forget unsaved work, e.g. after the host saved or discarded it.
    pub fn clear_unsaved(&mut self) {
        self.unsaved = false;
    }
}
