use approx::assert_relative_eq;
use geo::{wkt, Distance, Haversine, Point};

use super::{approximately_equal, DistanceApproximator, COORD_TOLERANCE_DEG};

#[test]
fn approximator_tracks_haversine_nearby() {
    let anchor = wkt! { POINT(151.19462 -33.885309) };
    let nearby = wkt! { POINT(151.19561 -33.884410) };

    let approximated = DistanceApproximator::new(anchor)
        .distance_squared(nearby)
        .sqrt();
    let reference = Haversine.distance(anchor, nearby);

    assert_relative_eq!(approximated, reference, max_relative = 0.01);
}

#[test]
fn approximator_is_zero_at_anchor() {
    let anchor = Point::new(9.186777, 48.773585);
    assert_eq!(DistanceApproximator::new(anchor).distance_squared(anchor), 0.0);
}

#[test]
fn tolerance_accepts_sub_unit_offsets() {
    let point = Point::new(151.2, -33.88);
    let inside = Point::new(151.2 + COORD_TOLERANCE_DEG * 0.9, -33.88);
    let outside = Point::new(151.2 + COORD_TOLERANCE_DEG * 1.5, -33.88);

    assert!(approximately_equal(point, point));
    assert!(approximately_equal(point, inside));
    assert!(!approximately_equal(point, outside));
}
