// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parcel registry: roll → parcel geometry, zone geometry, and derived data.
//!
//! ## Overview
//!
//! The registry is built once from the loaded parcel and zone features and is
//! read-only afterwards. For each parcel it precomputes the engine-order rings,
//! the bounds used to frame the viewport, and the centroid used for labels.
//!
//! Zones are joined to parcels by roll. A parcel may have no zone; a zone whose
//! roll matches no parcel is a join mismatch and is dropped at load.
//!
//! ## Hit testing
//!
//! Parcel bounds are bulk-loaded into an R-tree. A point query collects the
//! parcels whose bounds contain the point, then keeps those whose polygon
//! contains it (even-odd, holes respected). When several qualify, the one with
//! the smallest bounds wins, then the lowest roll, so results are deterministic.

use std::collections::BTreeMap;

use kurbo::Rect;
use parcelview_geom::{Geometry, LatLng, Rings, geo_bounds, rings_from_geometry};
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};

use crate::types::Roll;

type Envelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// One parcel and what the overlays need from it.
#[derive(Clone, Debug)]
pub struct ParcelEntry {
    /// Source parcel geometry.
    pub geometry: Geometry,
    /// Engine-order rings, absent if the geometry is not polygonal.
    pub rings: Option<Rings>,
    /// Bounds with `x` = longitude and `y` = latitude.
    pub bounds: Option<Rect>,
    /// Label anchor.
    pub centroid: Option<LatLng>,
    /// Associated buffer zone, if any.
    pub zone: Option<Geometry>,
}

/// Read-only lookup of parcels and zones by roll.
pub struct ParcelRegistry {
    entries: BTreeMap<Roll, ParcelEntry>,
    rolls: Vec<Roll>,
    tree: RTree<Envelope>,
}

impl core::fmt::Debug for ParcelRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let zones = self.entries.values().filter(|e| e.zone.is_some()).count();
        f.debug_struct("ParcelRegistry")
            .field("parcels", &self.entries.len())
            .field("zones", &zones)
            .field("indexed", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl Default for ParcelRegistry {
    fn default() -> Self {
        Self::new([], [])
    }
}

impl ParcelRegistry {
    /// Build the registry from parcel and zone features keyed by roll.
    ///
    /// A repeated parcel roll keeps the last geometry. Zones without a parcel are
    /// dropped with a warning.
    pub fn new(
        parcels: impl IntoIterator<Item = (Roll, Geometry)>,
        zones: impl IntoIterator<Item = (Roll, Geometry)>,
    ) -> Self {
        let mut entries = BTreeMap::new();
        for (roll, geometry) in parcels {
            let rings = match rings_from_geometry(&geometry) {
                Ok(rings) => Some(rings),
                Err(err) => {
                    tracing::warn!(%roll, %err, "parcel geometry is not an area; not hit-testable");
                    None
                }
            };
            let bounds = rings.as_ref().and_then(geo_bounds);
            let centroid = rings.as_ref().and_then(Rings::centroid);
            let entry = ParcelEntry {
                geometry,
                rings,
                bounds,
                centroid,
                zone: None,
            };
            if entries.insert(roll.clone(), entry).is_some() {
                tracing::warn!(%roll, "duplicate parcel roll; keeping the last geometry");
            }
        }

        let mut orphans = 0_usize;
        for (roll, zone) in zones {
            match entries.get_mut(&roll) {
                Some(entry) => entry.zone = Some(zone),
                None => {
                    orphans += 1;
                    tracing::warn!(%roll, "zone has no parcel with the same roll (join mismatch)");
                }
            }
        }

        let rolls: Vec<Roll> = entries.keys().cloned().collect();
        let envelopes = rolls
            .iter()
            .enumerate()
            .filter_map(|(i, roll)| {
                let b = entries.get(roll)?.bounds?;
                Some(GeomWithData::new(
                    Rectangle::from_corners([b.x0, b.y0], [b.x1, b.y1]),
                    i,
                ))
            })
            .collect();
        let tree = RTree::bulk_load(envelopes);
        tracing::debug!(
            parcels = entries.len(),
            indexed = tree.size(),
            orphans,
            "parcel registry loaded"
        );
        Self {
            entries,
            rolls,
            tree,
        }
    }

    /// Number of parcels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no parcels are loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All rolls in ascending order.
    pub fn rolls(&self) -> &[Roll] {
        &self.rolls
    }

    /// The parcel entry for `roll`.
    pub fn parcel(&self, roll: &Roll) -> Option<&ParcelEntry> {
        self.entries.get(roll)
    }

    /// The zone geometry for `roll`.
    pub fn zone(&self, roll: &Roll) -> Option<&Geometry> {
        self.entries.get(roll)?.zone.as_ref()
    }

    /// Engine-order rings of the parcel.
    pub fn rings(&self, roll: &Roll) -> Option<&Rings> {
        self.entries.get(roll)?.rings.as_ref()
    }

    /// Bounds of the parcel (`x` = longitude, `y` = latitude).
    pub fn bounds(&self, roll: &Roll) -> Option<Rect> {
        self.entries.get(roll)?.bounds
    }

    /// Centroid of the parcel.
    pub fn centroid(&self, roll: &Roll) -> Option<LatLng> {
        self.entries.get(roll)?.centroid
    }

    /// True if the parcel's polygon contains `p`.
    pub fn contains(&self, roll: &Roll, p: LatLng) -> bool {
        self.rings(roll).is_some_and(|r| r.contains(p))
    }

    /// The parcel under `p`, if any.
    pub fn hit_test(&self, p: LatLng) -> Option<Roll> {
        if !p.is_finite() {
            return None;
        }
        self.tree
            .locate_all_at_point(&[p.lng, p.lat])
            .map(|env| &self.rolls[env.data])
            .filter(|roll| self.contains(roll, p))
            .min_by(|a, b| {
                let area = |r: &Roll| self.bounds(r).map_or(f64::INFINITY, |b| b.area());
                area(a).total_cmp(&area(b)).then_with(|| a.cmp(b))
            })
            .cloned()
    }
}
