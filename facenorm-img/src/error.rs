use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("degenerate eye geometry: interocular distance {distance} is too small")]
    DegenerateGeometry { distance: f64 },

    #[error("expected {expected} landmarks, found {found}")]
    InvalidLandmarkCount { expected: usize, found: usize },

    #[error("invalid source image: {0}")]
    SourceImageInvalid(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed landmark or config JSON: {0}")]
    LandmarkParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Degenerate geometry and bad landmark counts mean the image should be
    /// skipped or flagged, not retried.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Error::DegenerateGeometry { .. }
                | Error::InvalidLandmarkCount { .. }
                | Error::SourceImageInvalid(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
