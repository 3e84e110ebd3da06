use crate::config::{AlignConfig, Config, FilterConfig};
use crate::error::Result;
use crate::filter;
use crate::geometry::EyeGeometry;
use crate::landmarks::LandmarkSet;
use crate::transform::{self, SimilarityTransform};
use crate::warp::{self, FloatImage};
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use tracing::{Level, debug, span, trace, warn};

/// A face normalized to the canonical pose, plus how it got there.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub image: RgbImage,
    pub transform: SimilarityTransform,
    pub geometry: EyeGeometry,
}

#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignConfig,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Result<Aligner> {
        config.validate()?;
        Ok(Aligner { config })
    }

    pub fn align(&self, img: &DynamicImage, landmarks: &LandmarkSet) -> Result<Alignment> {
        let span = span!(Level::DEBUG, "align");
        let _guard = span.enter();

        let src = FloatImage::from_dynamic(img)?;
        let geometry = EyeGeometry::from_landmarks(landmarks)?;
        let transform = transform::build(&geometry, &self.config.pose)?;
        trace!("Transform: {:?}", transform.matrix);

        let pose = &self.config.pose;
        let warped = warp::warp(
            &src,
            &transform,
            pose.width,
            pose.height,
            self.config.interpolation,
        )?;
        let image = warp::to_rgb8(&warped);

        if is_black(image.as_raw()) && !is_black(img.as_bytes()) {
            warn!("Aligned face is entirely black, landmarks may lie outside the image");
        }

        Ok(Alignment {
            image,
            transform,
            geometry,
        })
    }
}

fn is_black(raw: &[u8]) -> bool {
    raw.iter().all(|v| *v == 0)
}

#[derive(Debug, Clone)]
pub struct Processed {
    pub alignment: Alignment,
    pub filtered: RgbImage,
}

/// One image of a batch with its detected landmarks.
#[derive(Debug, Clone)]
pub struct Job {
    pub image: DynamicImage,
    pub landmarks: LandmarkSet,
}

/// Geometric alignment followed by photometric filtering.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    aligner: Aligner,
    filter: FilterConfig,
}

impl Preprocessor {
    pub fn new(config: &Config) -> Result<Preprocessor> {
        config.filter.validate()?;
        Ok(Preprocessor {
            aligner: Aligner::new(config.align)?,
            filter: config.filter,
        })
    }

    pub fn run(&self, img: &DynamicImage, landmarks: &LandmarkSet) -> Result<Processed> {
        let span = span!(Level::DEBUG, "preprocess");
        let _guard = span.enter();

        let alignment = self.aligner.align(img, landmarks)?;
        let filtered = filter::apply(&alignment.image, &self.filter);

        Ok(Processed {
            alignment,
            filtered,
        })
    }

    /// Processes independent images in parallel on the current rayon pool.
    /// Results are in job order; a failed image does not affect the rest.
    pub fn run_batch(&self, jobs: &[Job]) -> Vec<Result<Processed>> {
        debug!("Processing batch of {} images", jobs.len());

        jobs.par_iter()
            .map(|job| self.run(&job.image, &job.landmarks))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanonicalPose;
    use crate::error::Error;
    use crate::shapes::Point;
    use crate::test_utils::{assert_close, landmarks_with_eyes};
    use image::{Rgb, RgbImage};

    fn face_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(240, 240, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_align_reference_face() -> anyhow::Result<()> {
        let aligner = Aligner::new(AlignConfig::default())?;
        let landmarks = landmarks_with_eyes(Point::new(100., 150.), Point::new(140., 150.));

        let alignment = aligner.align(&face_image(), &landmarks)?;

        assert_eq!(alignment.image.dimensions(), (160, 160));
        assert_close(alignment.geometry.angle, 0., 1e-12);
        assert_close(alignment.transform.scale(), 1.2, 1e-12);
        let left = alignment.transform.apply(alignment.geometry.left_eye);
        assert_close(left.x, 56., 1e-6);
        assert_close(left.y, 56., 1e-6);

        // source pixel (100, 150) lands on (56, 56)
        assert_eq!(alignment.image.get_pixel(56, 56).0, [100, 150, 128]);
        Ok(())
    }

    #[test]
    fn test_align_rejects_degenerate() -> anyhow::Result<()> {
        let aligner = Aligner::new(AlignConfig::default())?;
        let landmarks = landmarks_with_eyes(Point::new(90., 90.), Point::new(90., 90.));

        let err = aligner.align(&face_image(), &landmarks).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry { .. }));
        assert!(err.is_skippable());
        Ok(())
    }

    #[test]
    fn test_align_rejects_empty_image() -> anyhow::Result<()> {
        let aligner = Aligner::new(AlignConfig::default())?;
        let landmarks = landmarks_with_eyes(Point::new(10., 10.), Point::new(30., 10.));
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));

        assert!(matches!(
            aligner.align(&empty, &landmarks),
            Err(Error::SourceImageInvalid(_))
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AlignConfig {
            pose: CanonicalPose::new(160, 160, 0.7, 0.35),
            ..Default::default()
        };
        assert!(matches!(
            Aligner::new(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_gray_source_yields_rgb() -> anyhow::Result<()> {
        let aligner = Aligner::new(AlignConfig::default())?;
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_fn(200, 200, |x, _| {
            image::Luma([x as u8])
        }));
        let landmarks = landmarks_with_eyes(Point::new(80., 100.), Point::new(120., 100.));

        let alignment = aligner.align(&gray, &landmarks)?;
        assert_eq!(alignment.image.as_raw().len(), 160 * 160 * 3);
        assert!(alignment.image.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
        Ok(())
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() -> anyhow::Result<()> {
        let preprocessor = Preprocessor::new(&Config::default())?;
        let jobs = vec![
            Job {
                image: face_image(),
                landmarks: landmarks_with_eyes(Point::new(100., 150.), Point::new(140., 150.)),
            },
            Job {
                image: face_image(),
                landmarks: landmarks_with_eyes(Point::new(50., 50.), Point::new(50., 50.)),
            },
            Job {
                image: face_image(),
                landmarks: landmarks_with_eyes(Point::new(60., 80.), Point::new(140., 120.)),
            },
        ];

        let results = preprocessor.run_batch(&jobs);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::DegenerateGeometry { .. })));

        let third = results[2].as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_close(third.alignment.transform.scale(), 48. / 8000f64.sqrt(), 1e-12);
        assert_eq!(third.filtered.dimensions(), (160, 160));
        Ok(())
    }
}
