// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ring extraction and the planar helpers built on it: bounds, containment, centroid.
//!
//! Planar helpers treat longitude as `x` and latitude as `y`. That is adequate at
//! parcel scale and is what the hit test and label placement need; it is not a
//! geodesic computation.

use kurbo::{Point, Rect};

use crate::types::{Geometry, GeometryError, LatLng, Position, Ring, Rings};

/// Extract rings from a polygonal geometry, swapping every position into engine order.
///
/// The output is structurally equivalent to the input. Any non-polygonal kind is
/// rejected with [`GeometryError::Unsupported`], and a polygon or multipolygon with
/// nothing in it with [`GeometryError::EmptyPolygon`].
///
/// ```
/// use parcelview_geom::{Geometry, LatLng, Rings, rings_from_geometry};
///
/// let g = Geometry::Polygon(vec![vec![[10.0, 1.0], [11.0, 1.0], [11.0, 2.0]]]);
/// let Rings::Polygon(rings) = rings_from_geometry(&g).unwrap() else { unreachable!() };
/// assert_eq!(rings[0][0], LatLng::new(1.0, 10.0));
/// ```
pub fn rings_from_geometry(geometry: &Geometry) -> Result<Rings, GeometryError> {
    match geometry {
        Geometry::Polygon(rings) if rings.is_empty() => Err(GeometryError::EmptyPolygon),
        Geometry::Polygon(rings) => Ok(Rings::Polygon(convert_polygon(rings))),
        Geometry::MultiPolygon(polys) if polys.is_empty() => Err(GeometryError::EmptyPolygon),
        Geometry::MultiPolygon(polys) => Ok(Rings::MultiPolygon(
            polys.iter().map(|p| convert_polygon(p)).collect(),
        )),
        other => Err(GeometryError::Unsupported { kind: other.kind() }),
    }
}

fn convert_polygon(rings: &[Vec<Position>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| ring.iter().copied().map(LatLng::from_position).collect())
        .collect()
}

fn to_point(p: LatLng) -> Point {
    Point::new(p.lng, p.lat)
}

/// Bounding box of every vertex, with `x` = longitude and `y` = latitude.
///
/// Returns `None` when there are no vertices.
pub fn geo_bounds(rings: &Rings) -> Option<Rect> {
    let mut points = rings
        .polygons()
        .flat_map(|poly| poly.iter().flatten())
        .copied()
        .map(to_point);
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

/// Even-odd containment of `p` in a single ring. Closing the ring is optional.
pub fn ring_contains(ring: &[LatLng], p: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let t = (p.lat - a.lat) / (b.lat - a.lat);
            if p.lng < a.lng + t * (b.lng - a.lng) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Planar area-weighted centroid of a ring.
///
/// Falls back to the center of the ring's bounds when the ring is degenerate
/// (collinear or zero area). Returns `None` for an empty ring.
pub fn ring_centroid(ring: &[LatLng]) -> Option<LatLng> {
    let first = to_point(*ring.first()?);
    let n = ring.len();
    let mut twice_area = 0.0;
    let (mut cx, mut cy) = (0.0, 0.0);
    let mut bounds = Rect::from_points(first, first);
    for i in 0..n {
        // Offset by the first vertex to keep the products small.
        let a = to_point(ring[i]) - first;
        let b = to_point(ring[(i + 1) % n]) - first;
        let cross = a.cross(b);
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
        bounds = bounds.union_pt(to_point(ring[i]));
    }
    if twice_area.abs() <= f64::EPSILON * 16.0 {
        let c = bounds.center();
        return Some(LatLng::new(c.y, c.x));
    }
    let k = 1.0 / (3.0 * twice_area);
    Some(LatLng::new(first.y + cy * k, first.x + cx * k))
}

/// Planar signed area of a ring in square degrees; used to rank rings by size.
fn ring_area_deg(ring: &[LatLng]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| to_point(ring[i]).to_vec2().cross(to_point(ring[(i + 1) % n]).to_vec2()))
        .sum::<f64>()
        .abs()
        * 0.5
}

impl Rings {
    /// True if `p` lies inside some polygon's outer ring and outside its holes.
    pub fn contains(&self, p: LatLng) -> bool {
        self.polygons().any(|poly| match poly.split_first() {
            Some((outer, holes)) => {
                ring_contains(outer, p) && !holes.iter().any(|h| ring_contains(h, p))
            }
            None => false,
        })
    }

    /// Centroid of the largest outer ring, used as a label anchor.
    pub fn centroid(&self) -> Option<LatLng> {
        self.outer_rings()
            .max_by(|a, b| ring_area_deg(a).total_cmp(&ring_area_deg(b)))
            .and_then(|r| ring_centroid(r))
    }
}
