//! Configuration types for robust fitting, warping and stitching.
//!
//! Every struct implements `Default` with the values the stitcher ships
//! with, and deserializes with `#[serde(default)]` so partial JSON configs
//! only need to name what they change.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StitchError};

/// Inlier count at which a round's inlier set is refit and rescored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementThreshold {
    /// `min(L, cap)` for `L` correspondences.
    Capped(usize),
    /// A fixed inlier count.
    Fixed(usize),
    /// `ceil(fraction * L)`.
    Fraction(f64),
}

impl RefinementThreshold {
    /// Concrete inlier count for a set of `n` correspondences.
    pub fn resolve(&self, n: usize) -> usize {
        match *self {
            Self::Capped(cap) => n.min(cap),
            Self::Fixed(count) => count,
            Self::Fraction(fraction) => (fraction.clamp(0.0, 1.0) * n as f64).ceil() as usize,
        }
    }
}

impl Default for RefinementThreshold {
    fn default() -> Self {
        Self::Capped(10)
    }
}

/// Settings of the RANSAC loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacSettings {
    /// Maximum transfer distance, in pixels, for a correspondence to count
    /// as an inlier.
    pub inlier_distance: f64,
    /// Number of correspondences drawn per round.
    pub sample_size: usize,
    /// Number of rounds; the loop always runs all of them.
    pub iterations: usize,
    pub refinement_threshold: RefinementThreshold,
    /// Fixed sampler seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            inlier_distance: 1.0,
            sample_size: 4,
            iterations: 2000,
            refinement_threshold: RefinementThreshold::default(),
            seed: None,
        }
    }
}

impl RansacSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.inlier_distance.is_finite() && self.inlier_distance > 0.0) {
            return Err(StitchError::InvalidSettings(format!(
                "inlier distance must be positive, got {}",
                self.inlier_distance
            )));
        }
        if self.sample_size == 0 {
            return Err(StitchError::InvalidSettings(
                "sample size must be at least 1".to_string(),
            ));
        }
        if let RefinementThreshold::Fraction(f) = self.refinement_threshold {
            if !f.is_finite() {
                return Err(StitchError::InvalidSettings(
                    "refinement fraction must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Continuous interpolant used to pull source pixel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    Bilinear,
    /// Keys cubic convolution (a = -0.5).
    #[default]
    Bicubic,
}

/// What to do with source coordinates outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderPolicy {
    /// Clamp neighbours to the nearest edge pixel, extending the image.
    #[default]
    Extend,
    /// Write the given value for every channel.
    Constant(f32),
}

/// Settings of the inverse-mapping resampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpSettings {
    pub interpolation: Interpolation,
    pub border: BorderPolicy,
    /// Output pixels evaluated per interpolation batch.
    pub batch_size: usize,
    /// Largest output canvas, in pixels, a warp may allocate.
    pub max_canvas_pixels: u64,
}

impl Default for WarpSettings {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            border: BorderPolicy::default(),
            batch_size: 64,
            max_canvas_pixels: 200_000_000,
        }
    }
}

impl WarpSettings {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(StitchError::InvalidSettings(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Extra room kept beyond the larger input when cropping a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasMargin {
    pub u: u32,
    pub v: u32,
}

impl Default for CanvasMargin {
    fn default() -> Self {
        Self { u: 700, v: 200 }
    }
}

/// Top-level configuration of a stitching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchSettings {
    pub ransac: RansacSettings,
    pub warp: WarpSettings,
    /// `None` keeps the full composite canvas.
    pub canvas_margin: Option<CanvasMargin>,
    /// Number of correspondences requested per image pair.
    pub correspondence_count: usize,
}

impl Default for StitchSettings {
    fn default() -> Self {
        Self {
            ransac: RansacSettings::default(),
            warp: WarpSettings::default(),
            canvas_margin: Some(CanvasMargin::default()),
            correspondence_count: 100,
        }
    }
}

impl StitchSettings {
    pub fn validate(&self) -> Result<()> {
        self.ransac.validate()?;
        self.warp.validate()
    }
}
