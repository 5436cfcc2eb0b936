// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Planar area estimates and human-readable area labels.
//!
//! The estimate projects a ring into pixel space at a reference zoom, takes the
//! shoelace area there, and scales pixels back to metres using the projection's
//! world size at that zoom. It carries the distortion of the projection (Web
//! Mercator inflates by roughly `1 / cos²(lat)`), which is acceptable for labels
//! and never intended for survey-grade measurement. Hosts with a geodesic area
//! routine should prefer it.

use kurbo::Point;

use crate::types::LatLng;

/// Equatorial circumference of the Earth in metres (WGS 84).
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.685_578_49;

/// Square metres per international acre.
pub const SQUARE_METERS_PER_ACRE: f64 = 4_046.856_422_4;

/// Estimate the area enclosed by `ring` in square metres.
///
/// - `zoom` is the reference zoom every vertex is projected at (typically the
///   engine's maximum zoom).
/// - `scale` is the projection's world width in pixels at `zoom`.
/// - `project` maps a geographic point at a zoom to pixel coordinates, or `None`
///   when it cannot.
///
/// Returns `None` for fewer than three vertices, a non-finite or non-positive
/// scale, or when any vertex fails to project.
///
/// ```
/// use kurbo::Point;
/// use parcelview_geom::{EARTH_CIRCUMFERENCE_M, LatLng, estimate_area_square_meters};
///
/// // One degree of either axis spans 1/360 of the world width.
/// let scale = 1.0e9;
/// let project = |p: LatLng, _z: f64| Some(Point::new(p.lng / 360.0 * scale, p.lat / 360.0 * scale));
/// let d = 100.0 / EARTH_CIRCUMFERENCE_M * 360.0;
/// let ring = [LatLng::new(0.0, 0.0), LatLng::new(0.0, d), LatLng::new(d, d), LatLng::new(d, 0.0)];
/// let area = estimate_area_square_meters(&ring, 20.0, scale, project).unwrap();
/// assert!((area - 10_000.0).abs() < 1e-3);
/// ```
pub fn estimate_area_square_meters<F>(
    ring: &[LatLng],
    zoom: f64,
    scale: f64,
    mut project: F,
) -> Option<f64>
where
    F: FnMut(LatLng, f64) -> Option<Point>,
{
    if ring.len() < 3 || !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let pts = ring
        .iter()
        .map(|&p| project(p, zoom))
        .collect::<Option<Vec<Point>>>()?;
    let n = pts.len();
    // Shoelace over vertices taken relative to the first one; same sum, less cancellation.
    let origin = pts[0];
    let twice_area: f64 = (0..n)
        .map(|i| (pts[i] - origin).cross(pts[(i + 1) % n] - origin))
        .sum();
    let px_area = twice_area.abs() * 0.5;
    let m_per_px = EARTH_CIRCUMFERENCE_M / scale;
    Some(px_area * m_per_px * m_per_px)
}

/// Render an area for a label.
///
/// Areas of at least one acre render in acres with two decimals; smaller areas
/// render as whole square metres. Non-finite input renders as `"n/a"`.
///
/// ```
/// use parcelview_geom::format_area;
///
/// assert_eq!(format_area(5_000.0), "5000 m²");
/// assert_eq!(format_area(8_093.7128448), "2.00 acres");
/// assert_eq!(format_area(f64::NAN), "n/a");
/// ```
pub fn format_area(square_meters: f64) -> String {
    if !square_meters.is_finite() {
        return "n/a".to_owned();
    }
    let acres = square_meters / SQUARE_METERS_PER_ACRE;
    if acres >= 1.0 {
        format!("{acres:.2} acres")
    } else {
        format!("{:.0} m²", square_meters.round())
    }
}
