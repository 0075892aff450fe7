//! The distance function a `TreeGrid` uses is a capability chosen once per
//! grid at construction, not a virtual call per cell.

use crate::Point;

/// Mean Earth radius in metres, used for the spherical approximation to the
/// geodesic distance. The original reference uses Bowring's method on the
/// full ellipsoid; this is a deliberate simplification (see DESIGN.md).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Planar,
    Geodesic,
}

impl Metric {
    /// Squared distance between two points, in the unit appropriate to the
    /// metric (squared ground units for `Planar`, squared metres for
    /// `Geodesic`).
    pub fn distance_sq(&self, a: Point, b: Point) -> f64 {
        match self {
            Metric::Planar => {
                let dx = a.x() - b.x();
                let dy = a.y() - b.y();
                dx * dx + dy * dy
            }
            Metric::Geodesic => {
                let d = haversine_metres(a, b);
                d * d
            }
        }
    }

    /// Converts a search radius in metres to a `(dx, dy)` half-extent in the
    /// grid's native coordinate units, via the local inverse geodesic at
    /// `home` along the east and north azimuths.
    pub fn radius_to_extent(&self, home: Point, radius_m: f64) -> (f64, f64) {
        match self {
            Metric::Planar => (radius_m, radius_m),
            Metric::Geodesic => {
                let lat_rad = home.y().to_radians();
                let dlat = (radius_m / EARTH_RADIUS_M).to_degrees();
                let denom = lat_rad.cos().max(1e-9);
                let dlon = (radius_m / (EARTH_RADIUS_M * denom)).to_degrees();
                (dlon, dlat)
            }
        }
    }
}

fn haversine_metres(a: Point, b: Point) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.x() - a.x()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().clamp(-1.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_is_pythagorean() {
        let d2 = Metric::Planar.distance_sq(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((d2 - 25.0).abs() < 1e-9);
    }

    #[test]
    fn geodesic_distance_zero_for_identical_points() {
        let d2 = Metric::Geodesic.distance_sq(Point::new(4.0, 50.0), Point::new(4.0, 50.0));
        assert!(d2 < 1e-6);
    }

    #[test]
    fn geodesic_extent_shrinks_longitude_toward_poles() {
        let (dlon_eq, _) = Metric::Geodesic.radius_to_extent(Point::new(0.0, 0.0), 10_000.0);
        let (dlon_hi, _) = Metric::Geodesic.radius_to_extent(Point::new(0.0, 80.0), 10_000.0);
        assert!(dlon_hi > dlon_eq);
    }
}
