//! Geometric models.

use nalgebra::Matrix3;

use crate::error::{Result, StitchError};
use crate::types::Point2D;

/// Entries below this magnitude are treated as zero when normalizing.
const NORMALIZATION_EPS: f64 = 1e-12;

/// Planar projective transformation represented by a 3x3 matrix.
///
/// Homographies are defined up to scale; [`Homography::new`] fixes the scale
/// so that `h[(2, 2)] == 1` whenever that entry is not zero. Values are never
/// mutated after construction; derive a new one instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Homography {
    h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        let scale = h[(2, 2)];
        if scale.abs() > NORMALIZATION_EPS {
            Self { h: h / scale }
        } else {
            Self { h }
        }
    }

    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    /// Pure translation by `(du, dv)`.
    pub fn translation(du: f64, dv: f64) -> Self {
        Self::new(Matrix3::new(1.0, 0.0, du, 0.0, 1.0, dv, 0.0, 0.0, 1.0))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    pub fn determinant(&self) -> f64 {
        self.h.determinant()
    }

    /// Inverse transform, renormalized so its `[2, 2]` entry is 1.
    pub fn inverse(&self) -> Result<Self> {
        self.h
            .try_inverse()
            .filter(|inv| inv.iter().all(|v| v.is_finite()))
            .map(Self::new)
            .ok_or(StitchError::SingularTransform)
    }

    /// Map a single point; `None` when it lands at infinity.
    pub fn apply(&self, p: &Point2D) -> Option<Point2D> {
        crate::transform::transform_point(self, p)
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}
