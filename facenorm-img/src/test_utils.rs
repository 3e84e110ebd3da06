use crate::landmarks::{LANDMARK_COUNT, LandmarkSet};
use crate::shapes::Point;

/// Landmarks whose eye contours are small hexagons centered on `left` and
/// `right`. Every other landmark sits at the origin.
pub fn landmarks_with_eyes(left: Point, right: Point) -> LandmarkSet {
    let ring = [
        (-3., 0.),
        (-1.5, -1.),
        (1.5, -1.),
        (3., 0.),
        (1.5, 1.),
        (-1.5, 1.),
    ];
    let mut points = vec![Point::new(0., 0.); LANDMARK_COUNT];
    for (i, (dx, dy)) in ring.iter().enumerate() {
        points[36 + i] = left + Point::new(*dx, *dy);
        points[42 + i] = right + Point::new(*dx, *dy);
    }
    LandmarkSet::new(points).unwrap()
}

pub fn assert_close(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() <= eps,
        "{actual} differs from {expected} by more than {eps}"
    );
}
