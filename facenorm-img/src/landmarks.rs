use crate::error::{Error, Result};
use crate::shapes::{Point, Polygon};
use std::ops::Range;
use std::path::Path;

pub const LANDMARK_COUNT: usize = 68;

const JAW_IDXS: Range<usize> = 0..17;
const R_BROW_IDXS: Range<usize> = 17..22;
const L_BROW_IDXS: Range<usize> = 22..27;
const NOSE_IDXS: Range<usize> = 27..36;
const L_EYE_IDXS: Range<usize> = 36..42;
const R_EYE_IDXS: Range<usize> = 42..48;
const MOUTH_IDXS: Range<usize> = 48..68;

/// Regions of the 68-point facial landmark scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Jaw,
    RightBrow,
    LeftBrow,
    Nose,
    LeftEye,
    RightEye,
    Mouth,
}

impl Feature {
    pub fn indices(&self) -> Range<usize> {
        match self {
            Feature::Jaw => JAW_IDXS,
            Feature::RightBrow => R_BROW_IDXS,
            Feature::LeftBrow => L_BROW_IDXS,
            Feature::Nose => NOSE_IDXS,
            Feature::LeftEye => L_EYE_IDXS,
            Feature::RightEye => R_EYE_IDXS,
            Feature::Mouth => MOUTH_IDXS,
        }
    }
}

/// Exactly 68 landmark points as produced by a 68-point shape predictor.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<LandmarkSet> {
        if points.len() != LANDMARK_COUNT {
            return Err(Error::InvalidLandmarkCount {
                expected: LANDMARK_COUNT,
                found: points.len(),
            });
        }

        Ok(LandmarkSet { points })
    }

    /// Parses a JSON array of `[x, y]` pairs.
    pub fn from_json(json: &str) -> Result<LandmarkSet> {
        let points: Vec<Point> = serde_json::from_str(json)?;
        LandmarkSet::new(points)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<LandmarkSet> {
        LandmarkSet::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.points)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn feature(&self, feature: Feature) -> Polygon {
        Polygon::new(self.points[feature.indices()].to_vec())
    }

    pub fn all(&self) -> Polygon {
        Polygon::new(self.points.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point> {
        (0..LANDMARK_COUNT)
            .map(|i| Point::new(i as f64, (i * 2) as f64))
            .collect()
    }

    #[test]
    fn test_rejects_wrong_count() {
        let mut points = grid();
        points.pop();

        match LandmarkSet::new(points) {
            Err(Error::InvalidLandmarkCount { expected, found }) => {
                assert_eq!(expected, 68);
                assert_eq!(found, 67);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_feature_ranges_cover_all_points() {
        let features = [
            Feature::Jaw,
            Feature::RightBrow,
            Feature::LeftBrow,
            Feature::Nose,
            Feature::LeftEye,
            Feature::RightEye,
            Feature::Mouth,
        ];

        let total: usize = features.iter().map(|f| f.indices().len()).sum();
        assert_eq!(total, LANDMARK_COUNT);
        assert_eq!(Feature::LeftEye.indices(), 36..42);
        assert_eq!(Feature::RightEye.indices(), 42..48);
    }

    #[test]
    fn test_feature_points() -> anyhow::Result<()> {
        let set = LandmarkSet::new(grid())?;
        let eye = set.feature(Feature::LeftEye);

        assert_eq!(eye.points.len(), 6);
        assert_eq!(eye.points[0], Point::new(36., 72.));
        assert_eq!(eye.points[5], Point::new(41., 82.));
        Ok(())
    }

    #[test]
    fn test_json_accepts_integer_pairs() -> anyhow::Result<()> {
        let json = serde_json::to_string(
            &(0..LANDMARK_COUNT)
                .map(|i| [i as i64, 3])
                .collect::<Vec<_>>(),
        )?;
        let set = LandmarkSet::from_json(&json)?;

        assert_eq!(set.points()[10], Point::new(10., 3.));
        Ok(())
    }

    #[test]
    fn test_json_wrong_length() {
        let err = LandmarkSet::from_json("[[1, 2], [3, 4]]").unwrap_err();
        assert!(matches!(err, Error::InvalidLandmarkCount { found: 2, .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = LandmarkSet::from_json("[[1, 2], [3").unwrap_err();
        assert!(matches!(err, Error::LandmarkParse(_)));
    }

    #[test]
    fn test_save_and_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("landmarks.json");
        let set = LandmarkSet::new(grid())?;

        set.save(&path)?;
        assert_eq!(LandmarkSet::load(&path)?, set);
        Ok(())
    }
}
