//! Error type shared by estimation, warping and stitching.

use thiserror::Error;

/// Everything that can go wrong while stitching a panorama.
#[derive(Debug, Error)]
pub enum StitchError {
    /// Too few correspondences, collinear points or a rank-deficient system.
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    /// The homography cannot be inverted, or maps the whole image to infinity.
    #[error("homography is singular and cannot be used for warping")]
    SingularTransform,

    /// Not enough correspondences to draw a sample without replacement.
    #[error("cannot draw a sample of {requested} from {available} correspondences")]
    OutOfRangeSample { requested: usize, available: usize },

    /// The robust fit had no round at all to take a result from.
    #[error("robust fit produced no inlier set")]
    EmptyInlierSet,

    #[error("correspondence lists differ in length ({src} source vs {dst} target points)")]
    LengthMismatch { src: usize, dst: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("warped canvas {width}x{height} exceeds the limit of {limit} pixels")]
    CanvasTooLarge { width: u64, height: u64, limit: u64 },

    #[error("no correspondences available for stitching stage {stage}")]
    MissingCorrespondences { stage: usize },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StitchError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StitchError>;
