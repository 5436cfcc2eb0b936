// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display styles for parcels and overlay shapes.

use crate::types::{Roll, Selection};

/// An sRGB color with alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba {
    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
    /// Parcel outline with no record.
    pub const PARCEL: Self = Self::rgb(0x33, 0x88, 0xff);
    /// Active selection highlight.
    pub const HIGHLIGHT: Self = Self::rgb(0xff, 0xd6, 0x00);
    /// Zone outline drawn over imagery.
    pub const ZONE: Self = Self::rgb(0xff, 0xff, 0x00);
    /// Size outline.
    pub const MEASURE: Self = Self::rgb(0x00, 0xe5, 0xff);
}

/// Severity of a stored request record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational.
    Low,
    /// Needs attention.
    Medium,
    /// Urgent.
    High,
}

impl Severity {
    /// Outline color for parcels carrying a record of this severity.
    pub const fn color(self) -> Rgba {
        match self {
            Self::Low => Rgba::rgb(0x2e, 0xb8, 0x5c),
            Self::Medium => Rgba::rgb(0xff, 0x98, 0x00),
            Self::High => Rgba::rgb(0xe5, 0x39, 0x35),
        }
    }
}

/// Style of a parcel feature.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParcelStyle {
    /// Outline color.
    pub stroke: Rgba,
    /// Outline width in pixels.
    pub weight: f64,
    /// Fill color.
    pub fill: Rgba,
    /// Fill opacity in `0.0..=1.0`.
    pub fill_opacity: f64,
}

/// Style of an overlay polygon.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeStyle {
    /// Outline color, or `None` for no outline.
    pub stroke: Option<Rgba>,
    /// Outline width in pixels.
    pub weight: f64,
    /// Dashed outline.
    pub dashed: bool,
    /// Fill color, or `None` for no fill.
    pub fill: Option<Rgba>,
    /// Holes are cut with even-odd fill semantics.
    pub even_odd: bool,
    /// Shape receives pointer input.
    pub interactive: bool,
}

impl ShapeStyle {
    /// Opaque inverse mask hiding imagery outside the zone.
    pub const MASK: Self = Self {
        stroke: None,
        weight: 0.0,
        dashed: false,
        fill: Some(Rgba::BLACK),
        even_odd: true,
        interactive: false,
    };
    /// Dashed zone outline.
    pub const ZONE_OUTLINE: Self = Self {
        stroke: Some(Rgba::ZONE),
        weight: 2.0,
        dashed: true,
        fill: None,
        even_odd: false,
        interactive: false,
    };
    /// Parcel outline drawn by the size overlay.
    pub const SIZE_OUTLINE: Self = Self {
        stroke: Some(Rgba::MEASURE),
        weight: 3.0,
        dashed: false,
        fill: None,
        even_odd: false,
        interactive: false,
    };
}

/// Compute the style of `roll` under the current selection.
///
/// Inactive parcels are outlined in their record's severity color (or the plain
/// parcel color) with a faint fill. The active parcel is outlined with the
/// highlight color and a heavier stroke, and its fill pulses with the blink phase.
pub fn parcel_style(roll: &Roll, selection: &Selection, severity: Option<Severity>) -> ParcelStyle {
    let base = severity.map_or(Rgba::PARCEL, Severity::color);
    if selection.is_active(roll) {
        ParcelStyle {
            stroke: Rgba::HIGHLIGHT,
            weight: 4.0,
            fill: Rgba::HIGHLIGHT,
            fill_opacity: if selection.blink_on() { 0.45 } else { 0.15 },
        }
    } else {
        ParcelStyle {
            stroke: base,
            weight: 1.0,
            fill: base,
            fill_opacity: 0.1,
        }
    }
}
