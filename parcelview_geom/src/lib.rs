// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parcelview Geom: geometry utilities for parcel and zone overlays.
//!
//! ## Overview
//!
//! Source features arrive as GeoJSON-shaped [`Geometry`] values with positions in
//! `[longitude, latitude]` order. Map engines want `(latitude, longitude)`.
//! This crate bridges the two and computes the shapes and numbers the overlays draw:
//!
//! - [`rings_from_geometry`]: polygon/multipolygon → engine-order [`Rings`].
//! - [`build_inverse_mask`]: a world-covering polygon with one hole per polygon,
//!   which an opaque fill turns into "show only this zone".
//! - [`estimate_area_square_meters`] and [`format_area`]: a planar area estimate
//!   through any pixel projection, and its label text.
//! - [`geo_bounds`], [`Rings::contains`], [`Rings::centroid`]: bounds for viewport
//!   framing, even-odd containment for hit testing, and label anchors.
//!
//! Everything here is pure; nothing logs, allocates handles, or talks to an engine.
//!
//! ## Known approximation
//!
//! Masks only cut holes from each polygon's outer ring. A zone with inner rings
//! (a donut) reveals imagery inside its inner void as well.
//!
//! ## Example
//!
//! ```
//! use parcelview_geom::{Geometry, build_inverse_mask, rings_from_geometry, MASK_LAT_LIMIT};
//!
//! let zone = Geometry::MultiPolygon(vec![
//!     vec![vec![[0.0, 0.0], [0.001, 0.0], [0.001, 0.001], [0.0, 0.0]]],
//!     vec![vec![[0.01, 0.0], [0.011, 0.0], [0.011, 0.001], [0.01, 0.0]]],
//! ]);
//! let rings = rings_from_geometry(&zone).unwrap();
//! let mask = build_inverse_mask(Some(&zone), &rings).unwrap();
//! assert_eq!(mask.holes.len(), 2);
//! assert!(mask.outer.iter().all(|p| p.lat.abs() == MASK_LAT_LIMIT));
//! ```

pub mod area;
pub mod mask;
pub mod rings;
pub mod types;

pub use area::{
    EARTH_CIRCUMFERENCE_M, SQUARE_METERS_PER_ACRE, estimate_area_square_meters, format_area,
};
pub use mask::{InverseMask, MASK_LAT_LIMIT, MASK_LNG_LIMIT, build_inverse_mask, world_ring};
pub use rings::{geo_bounds, ring_centroid, ring_contains, rings_from_geometry};
pub use types::{Geometry, GeometryError, LatLng, Position, Ring, Rings};
