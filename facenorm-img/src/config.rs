use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output geometry every aligned face is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalPose {
    pub width: u32,
    pub height: u32,
    /// Left eye center target, as a fraction of the canvas width.
    pub left_eye_x: f64,
    /// Left eye center target, as a fraction of the canvas height.
    pub left_eye_y: f64,
    /// Right eye center target as a fraction of the canvas width. Mirrors the
    /// left eye (`1 - left_eye_x`) when unset.
    pub right_eye_x: Option<f64>,
}

impl Default for CanonicalPose {
    fn default() -> Self {
        Self {
            width: 160,
            height: 160,
            left_eye_x: 0.35,
            left_eye_y: 0.35,
            right_eye_x: None,
        }
    }
}

impl CanonicalPose {
    pub fn new(width: u32, height: u32, left_eye_x: f64, left_eye_y: f64) -> Self {
        Self {
            width,
            height,
            left_eye_x,
            left_eye_y,
            right_eye_x: None,
        }
    }

    pub fn right_eye_fraction(&self) -> f64 {
        self.right_eye_x.unwrap_or(1. - self.left_eye_x)
    }

    pub fn desired_interocular_distance(&self) -> f64 {
        (self.right_eye_fraction() - self.left_eye_x) * self.width as f64
    }

    /// Pixel the left eye center is pinned to.
    pub fn left_eye_target(&self) -> (f64, f64) {
        (
            self.left_eye_x * self.width as f64,
            self.left_eye_y * self.height as f64,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }

        for (name, v) in [
            ("left_eye_x", self.left_eye_x),
            ("left_eye_y", self.left_eye_y),
            ("right_eye_x", self.right_eye_fraction()),
        ] {
            if !(0. ..=1.).contains(&v) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {v}"
                )));
            }
        }

        if !(self.desired_interocular_distance() > 0.) {
            return Err(Error::InvalidConfig(format!(
                "right eye target ({}) must lie right of left eye target ({})",
                self.right_eye_fraction(),
                self.left_eye_x
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub pose: CanonicalPose,
    pub interpolation: Interpolation,
}

impl AlignConfig {
    pub fn validate(&self) -> Result<()> {
        self.pose.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub clahe_clip_limit: f32,
    /// Tiles per side of the CLAHE grid.
    pub clahe_tiles: u32,
    /// Median window is `2 * radius + 1` pixels wide.
    pub median_radius: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.,
            clahe_tiles: 8,
            median_radius: 2,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.clahe_tiles == 0 {
            return Err(Error::InvalidConfig(
                "clahe_tiles must be at least 1".to_string(),
            ));
        }

        if !(self.clahe_clip_limit > 0.) {
            return Err(Error::InvalidConfig(format!(
                "clahe_clip_limit must be positive, got {}",
                self.clahe_clip_limit
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub align: AlignConfig,
    pub filter: FilterConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.align.validate()?;
        self.filter.validate()
    }
}
