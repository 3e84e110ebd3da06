use crate::error::{Error, Result};
use crate::landmarks::{Feature, LandmarkSet};
use crate::shapes::Point;
use serde::Serialize;
use tracing::debug;

/// Eye centers closer than this are treated as the same point.
pub const MIN_INTEROCULAR_DISTANCE: f64 = 1e-6;

/// Eye geometry of a single face, derived fresh for each alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EyeGeometry {
    pub left_eye: Point,
    pub right_eye: Point,
    /// Midpoint between the eye centers.
    pub pivot: Point,
    /// Roll of the eye line in degrees, from `atan2(dy, dx)`.
    pub angle: f64,
    pub interocular_distance: f64,
}

impl EyeGeometry {
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Result<EyeGeometry> {
        let left_eye = eye_center(landmarks, Feature::LeftEye)?;
        let right_eye = eye_center(landmarks, Feature::RightEye)?;
        EyeGeometry::from_eye_centers(left_eye, right_eye)
    }

    pub fn from_eye_centers(left_eye: Point, right_eye: Point) -> Result<EyeGeometry> {
        let interocular_distance = left_eye.distance(&right_eye);

        // also catches NaN coordinates
        if !(interocular_distance >= MIN_INTEROCULAR_DISTANCE) || !interocular_distance.is_finite()
        {
            return Err(Error::DegenerateGeometry {
                distance: interocular_distance,
            });
        }

        let delta = right_eye - left_eye;
        let angle = delta.y.atan2(delta.x).to_degrees();
        debug!("Interocular distance: {interocular_distance:.2}px, roll: {angle:.2}deg");

        Ok(EyeGeometry {
            left_eye,
            right_eye,
            pivot: left_eye.midpoint(&right_eye),
            angle,
            interocular_distance,
        })
    }
}

fn eye_center(landmarks: &LandmarkSet, eye: Feature) -> Result<Point> {
    landmarks
        .feature(eye)
        .centroid()
        .ok_or(Error::DegenerateGeometry { distance: 0. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::landmarks_with_eyes;

    #[test]
    fn test_level_eyes() -> anyhow::Result<()> {
        let landmarks = landmarks_with_eyes(Point::new(100., 150.), Point::new(140., 150.));
        let geometry = EyeGeometry::from_landmarks(&landmarks)?;

        assert!((geometry.left_eye.x - 100.).abs() < 1e-9);
        assert!((geometry.left_eye.y - 150.).abs() < 1e-9);
        assert!((geometry.right_eye.x - 140.).abs() < 1e-9);
        assert_eq!(geometry.angle, 0.);
        assert!((geometry.interocular_distance - 40.).abs() < 1e-9);
        assert!((geometry.pivot.x - 120.).abs() < 1e-9);
        assert!((geometry.pivot.y - 150.).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_vertical_eyes() -> anyhow::Result<()> {
        let geometry = EyeGeometry::from_eye_centers(Point::new(50., 10.), Point::new(50., 70.))?;

        assert!((geometry.angle - 90.).abs() < 1e-9);
        assert!((geometry.interocular_distance - 60.).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_tilted_eyes() -> anyhow::Result<()> {
        let geometry = EyeGeometry::from_eye_centers(Point::new(0., 0.), Point::new(-10., -10.))?;

        assert!((geometry.angle + 135.).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_identical_eyes_are_degenerate() {
        let landmarks = landmarks_with_eyes(Point::new(80., 80.), Point::new(80., 80.));

        match EyeGeometry::from_landmarks(&landmarks) {
            Err(Error::DegenerateGeometry { distance }) => assert!(distance < 1e-9),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_nan_landmarks_are_degenerate() {
        let landmarks = landmarks_with_eyes(Point::new(f64::NAN, 80.), Point::new(120., 80.));

        assert!(matches!(
            EyeGeometry::from_landmarks(&landmarks),
            Err(Error::DegenerateGeometry { .. })
        ));
    }
}
