//! Coordinate tolerance and cheap planar distance used by the shape
//! walker. A walk compares thousands of shape vertices against node
//! positions; the [`DistanceApproximator`] trades great-circle accuracy
//! for a single trigonometric evaluation per anchor point.

#[cfg(test)]
mod test;

use geo::Point;

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE_LAT: f64 = 110_567.0;

/// Per-axis tolerance for treating two coordinates as the same vertex.
/// Must match the precision of the upstream shape generator: shapes are
/// emitted with five decimal places, so anything within one unit of the
/// last place is the same point.
pub const COORD_TOLERANCE_DEG: f64 = 1e-5;

/// Slack added to an edge length when bounding the shape scan for its
/// end node. Covers the coordinate tolerance plus minor variance
/// between edge geometry and the declared length.
pub const EDGE_LENGTH_SLACK_M: f64 = 50.0;

/// Whether two coordinates coincide within [`COORD_TOLERANCE_DEG`] on
/// both axes.
pub fn approximately_equal(a: Point<f64>, b: Point<f64>) -> bool {
    (a.x() - b.x()).abs() <= COORD_TOLERANCE_DEG && (a.y() - b.y()).abs() <= COORD_TOLERANCE_DEG
}

/// Planar distance approximation anchored at a fixed point. Longitude
/// scaling is evaluated once at construction; every subsequent query is
/// two multiplies per axis, which keeps the walker's inner loop free of
/// trigonometry.
///
/// Accuracy degrades with distance from the anchor. The walker only
/// ever queries points within a few hundred meters of it.
pub struct DistanceApproximator {
    anchor: Point<f64>,
    meters_per_lng_degree: f64,
}

impl DistanceApproximator {
    pub fn new(anchor: Point<f64>) -> Self {
        DistanceApproximator {
            anchor,
            meters_per_lng_degree: anchor.y().to_radians().cos() * METERS_PER_DEGREE_LAT,
        }
    }

    /// Squared distance in meters² from the anchor to `point`.
    pub fn distance_squared(&self, point: Point<f64>) -> f64 {
        let lat_m = (point.y() - self.anchor.y()) * METERS_PER_DEGREE_LAT;
        let lng_m = (point.x() - self.anchor.x()) * self.meters_per_lng_degree;

        lat_m * lat_m + lng_m * lng_m
    }
}
