use crate::config::CanonicalPose;
use crate::error::{Error, Result};
use crate::geometry::EyeGeometry;
use crate::shapes::Point;
use serde::{Deserialize, Serialize};
use tracing::{Level, debug, span};

/// 2x3 affine matrix restricted to rotation, uniform scale and translation.
///
/// Maps a source point `(x, y)` to
/// `(m[0][0] x + m[0][1] y + m[0][2], m[1][0] x + m[1][1] y + m[1][2])`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityTransform {
    pub matrix: [[f64; 3]; 2],
}

impl SimilarityTransform {
    pub fn identity() -> Self {
        Self {
            matrix: [[1., 0., 0.], [0., 1., 0.]],
        }
    }

    /// Rotation by `angle_deg` (counter-clockwise as displayed, i.e. a
    /// positive image-space roll is undone) and uniform `scale`, keeping
    /// `pivot` fixed.
    pub fn rotation_about(pivot: Point, angle_deg: f64, scale: f64) -> Self {
        let theta = angle_deg.to_radians();
        let alpha = scale * theta.cos();
        let beta = scale * theta.sin();

        Self {
            matrix: [
                [alpha, beta, (1. - alpha) * pivot.x - beta * pivot.y],
                [-beta, alpha, beta * pivot.x + (1. - alpha) * pivot.y],
            ],
        }
    }

    /// Replaces the translation so that `source` lands exactly on `target`.
    /// Only the rotation/scale block is used to place `source`; any existing
    /// translation is discarded rather than corrected.
    pub fn anchored(mut self, source: Point, target: Point) -> Self {
        let placed = self.apply_linear(source);
        self.matrix[0][2] = target.x - placed.x;
        self.matrix[1][2] = target.y - placed.y;
        self
    }

    pub fn apply(&self, p: Point) -> Point {
        let linear = self.apply_linear(p);
        Point::new(linear.x + self.matrix[0][2], linear.y + self.matrix[1][2])
    }

    fn apply_linear(&self, p: Point) -> Point {
        let [[a, b, _], [c, d, _]] = self.matrix;
        Point::new(a * p.x + b * p.y, c * p.x + d * p.y)
    }

    pub fn determinant(&self) -> f64 {
        let [[a, b, _], [c, d, _]] = self.matrix;
        a * d - b * c
    }

    /// Uniform scale factor of the rotation/scale block.
    pub fn scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    pub fn rotation_degrees(&self) -> f64 {
        let [[a, b, _], _] = self.matrix;
        b.atan2(a).to_degrees()
    }

    /// Output-to-source mapping used by the warper.
    pub fn invert(&self) -> Result<Self> {
        let det = self.determinant();
        if !(det.abs() > f64::EPSILON) || !det.is_finite() {
            return Err(Error::DegenerateGeometry { distance: det.abs() });
        }

        let [[a, b, tx], [c, d, ty]] = self.matrix;
        let (ia, ib, ic, id) = (d / det, -b / det, -c / det, a / det);

        Ok(Self {
            matrix: [
                [ia, ib, -(ia * tx + ib * ty)],
                [ic, id, -(ic * tx + id * ty)],
            ],
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds the transform that levels the eye line, scales the interocular
/// distance to the pose's desired distance and pins the left eye center to
/// the pose's target pixel.
pub fn build(geometry: &EyeGeometry, pose: &CanonicalPose) -> Result<SimilarityTransform> {
    let span = span!(Level::DEBUG, "build_transform");
    let _guard = span.enter();

    if !(geometry.interocular_distance > 0.) {
        return Err(Error::DegenerateGeometry {
            distance: geometry.interocular_distance,
        });
    }

    let scale = pose.desired_interocular_distance() / geometry.interocular_distance;
    let (tx, ty) = pose.left_eye_target();

    let transform = SimilarityTransform::rotation_about(geometry.pivot, geometry.angle, scale)
        .anchored(geometry.left_eye, Point::new(tx, ty));
    debug!(
        "Scale: {:.4}, rotation: {:.2}deg, left eye target: ({tx:.2}, {ty:.2})",
        transform.scale(),
        transform.rotation_degrees()
    );

    Ok(transform)
}
