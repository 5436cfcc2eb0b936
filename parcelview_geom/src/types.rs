// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types: geographic points, source geometry, extracted rings, and errors.

use thiserror::Error;

/// A source coordinate in `[longitude, latitude]` order, as found in GeoJSON.
pub type Position = [f64; 2];

/// A closed or open ring of engine-order points.
pub type Ring = Vec<LatLng>;

/// A geographic point in engine order (latitude first).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Create a point from latitude and longitude.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Swap a `[lng, lat]` source position into engine order.
    pub const fn from_position(p: Position) -> Self {
        Self { lat: p[1], lng: p[0] }
    }

    /// Both components are finite.
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Source geometry as loaded from an external feature collection.
///
/// Only [`Polygon`](Geometry::Polygon) and [`MultiPolygon`](Geometry::MultiPolygon)
/// are meaningful for parcels and zones. The other kinds exist so that callers can
/// hand over whatever the dataset contains and get a precise
/// [`GeometryError::Unsupported`] back.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A single position.
    Point(Position),
    /// Several positions.
    MultiPoint(Vec<Position>),
    /// An open path.
    LineString(Vec<Position>),
    /// Several open paths.
    MultiLineString(Vec<Vec<Position>>),
    /// Rings; the first is the outer boundary, the rest are holes.
    Polygon(Vec<Vec<Position>>),
    /// Several polygons, each a list of rings.
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// GeoJSON type name of this geometry.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

/// Rings extracted from a polygonal [`Geometry`], in engine order.
///
/// The shape mirrors the input: a polygon stays a list of rings, a multipolygon
/// stays a list of polygons.
#[derive(Clone, Debug, PartialEq)]
pub enum Rings {
    /// Rings of a single polygon; index 0 is the outer ring.
    Polygon(Vec<Ring>),
    /// Polygons, each a list of rings with the outer ring first.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Rings {
    /// Iterate polygons as ring slices. A single polygon yields once.
    pub fn polygons(&self) -> impl Iterator<Item = &[Ring]> + '_ {
        let (single, multi): (Option<&[Ring]>, &[Vec<Ring>]) = match self {
            Self::Polygon(rings) => (Some(rings.as_slice()), &[]),
            Self::MultiPolygon(polys) => (None, polys.as_slice()),
        };
        single.into_iter().chain(multi.iter().map(Vec::as_slice))
    }

    /// Outer ring of every polygon that has one.
    pub fn outer_rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.polygons().filter_map(|p| p.first())
    }

    /// True if this value came from a [`Geometry::MultiPolygon`].
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::MultiPolygon(_))
    }
}

/// Failures while turning source geometry into drawable rings or masks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// The geometry kind cannot be treated as an area.
    #[error("unsupported geometry kind `{kind}`")]
    Unsupported {
        /// GeoJSON type name of the rejected geometry.
        kind: &'static str,
    },
    /// A polygon without rings.
    #[error("polygon has no rings")]
    EmptyPolygon,
    /// No inverse mask could be built from the rings.
    #[error("inverse mask construction failed")]
    MaskConstruction,
}
