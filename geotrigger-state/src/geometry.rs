//! Containment tests for circular and polygon regions
//!
//! Pure functions, no state. Circular containment uses great-circle
//! distance via the spherical law of cosines; polygon containment uses
//! ray casting (even-odd rule) with longitude normalization so that
//! polygons straddling the antimeridian evaluate correctly.

use geotrigger_api::model::{Coordinate, Geometry, Region};

/// Mean Earth radius, meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates, in meters
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let cos_angle = lat_a.sin() * lat_b.sin() + lat_a.cos() * lat_b.cos() * delta_lon.cos();
    // Floating point can push the cosine a hair outside [-1, 1]
    cos_angle.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_METERS
}

/// Whether `point` lies inside `region`
///
/// Circular regions use a strict `<` against the radius, so a point at
/// exactly the radius is outside.
pub fn contains(region: &Region, point: &Coordinate) -> bool {
    match &region.geometry {
        Geometry::Circle { center, radius_m } => distance_meters(center, point) < *radius_m,
        Geometry::Polygon { vertices } => polygon_contains(vertices, point),
    }
}

/// Ray-casting even-odd test over a closed ring
///
/// Edges whose longitude span exceeds 180 degrees are assumed to cross
/// the antimeridian; both endpoints are shifted by 360 degrees toward
/// the sign of the test point before the crossing test.
pub fn polygon_contains(vertices: &[Coordinate], point: &Coordinate) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (lon_i, lon_j) = normalize_edge(
            vertices[i].longitude,
            vertices[j].longitude,
            point.longitude,
        );
        let lat_i = vertices[i].latitude;
        let lat_j = vertices[j].latitude;

        if (lon_i < point.longitude) != (lon_j < point.longitude) {
            let lat_at_point =
                lat_i + (point.longitude - lon_i) / (lon_j - lon_i) * (lat_j - lat_i);
            if lat_at_point > point.latitude {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn normalize_edge(mut lon_i: f64, mut lon_j: f64, point_lon: f64) -> (f64, f64) {
    if (lon_i - lon_j).abs() > 180.0 {
        if point_lon < 0.0 {
            if lon_i > 0.0 {
                lon_i -= 360.0;
            }
            if lon_j > 0.0 {
                lon_j -= 360.0;
            }
        } else {
            if lon_i < 0.0 {
                lon_i += 360.0;
            }
            if lon_j < 0.0 {
                lon_j += 360.0;
            }
        }
    }
    (lon_i, lon_j)
}
