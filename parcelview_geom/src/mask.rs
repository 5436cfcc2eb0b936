// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inverse masks: a world-sized polygon with one hole per constituent polygon.
//!
//! Filled opaquely with even-odd (or hole-aware) semantics, the mask hides
//! everything except the interior of the holes. It is a rendering device, not a
//! boolean difference: only the outer ring of each input polygon becomes a hole,
//! so inner rings of the input (donut-shaped zones) are not reflected.

use crate::types::{Geometry, LatLng, Ring, Rings};

/// Latitude limit of the mask's outer boundary (Web-Mercator usable range).
pub const MASK_LAT_LIMIT: f64 = 85.0;

/// Longitude limit of the mask's outer boundary.
pub const MASK_LNG_LIMIT: f64 = 180.0;

/// A single polygon: a world-covering outer ring plus holes.
#[derive(Clone, Debug, PartialEq)]
pub struct InverseMask {
    /// World-covering boundary.
    pub outer: Ring,
    /// One hole per input polygon, taken from that polygon's outer ring.
    pub holes: Vec<Ring>,
}

impl InverseMask {
    /// All rings in drawing order: the outer boundary first, then the holes.
    pub fn rings(&self) -> Vec<Ring> {
        let mut out = Vec::with_capacity(self.holes.len() + 1);
        out.push(self.outer.clone());
        out.extend(self.holes.iter().cloned());
        out
    }
}

/// The world-covering outer boundary used by every mask.
pub fn world_ring() -> Ring {
    vec![
        LatLng::new(-MASK_LAT_LIMIT, -MASK_LNG_LIMIT),
        LatLng::new(-MASK_LAT_LIMIT, MASK_LNG_LIMIT),
        LatLng::new(MASK_LAT_LIMIT, MASK_LNG_LIMIT),
        LatLng::new(MASK_LAT_LIMIT, -MASK_LNG_LIMIT),
    ]
}

/// Build an inverse mask revealing only the interior of `rings`.
///
/// `geometry` is the source the rings were extracted from. Returns `None` when it
/// is absent, not polygonal, does not match the shape of `rings`, or when no
/// polygon has an outer ring with at least three vertices. Callers treat `None`
/// as "cannot mask".
///
/// ```
/// use parcelview_geom::{Geometry, build_inverse_mask, rings_from_geometry};
///
/// let g = Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
/// let rings = rings_from_geometry(&g).unwrap();
/// let mask = build_inverse_mask(Some(&g), &rings).unwrap();
/// assert_eq!(mask.holes.len(), 1);
/// ```
pub fn build_inverse_mask(geometry: Option<&Geometry>, rings: &Rings) -> Option<InverseMask> {
    match (geometry?, rings) {
        (Geometry::Polygon(_), Rings::Polygon(_))
        | (Geometry::MultiPolygon(_), Rings::MultiPolygon(_)) => {}
        _ => return None,
    }
    let holes: Vec<Ring> = rings
        .outer_rings()
        .filter(|outer| outer.len() >= 3)
        .cloned()
        .collect();
    if holes.is_empty() {
        return None;
    }
    Some(InverseMask {
        outer: world_ring(),
        holes,
    })
}
