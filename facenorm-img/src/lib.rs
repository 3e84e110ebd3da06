pub mod config;
pub mod draw;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod landmarks;
pub mod pipeline;
pub mod shapes;
pub mod transform;
pub mod warp;

#[cfg(test)]
mod test_utils;

pub use config::{AlignConfig, CanonicalPose, Config, FilterConfig, Interpolation};
pub use error::{Error, Result};
pub use geometry::EyeGeometry;
pub use landmarks::{Feature, LandmarkSet};
pub use pipeline::{Aligner, Alignment, Job, Preprocessor, Processed};
pub use shapes::Point;
pub use transform::SimilarityTransform;
