//! Scoring primitives.
//!
//! A score is the number of rows whose residual stays within the inlier
//! distance. Candidates compare by that count alone.

use std::marker::PhantomData;

use crate::core::Scoring;
use crate::models::Homography;
use crate::transform::transfer_distance;
use crate::types::{DataMatrix, Point2D};

/// Support of a model hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    pub inlier_count: usize,
}

impl Score {
    pub fn new(inlier_count: usize) -> Self {
        Self { inlier_count }
    }
}

/// Counts the correspondence rows a model explains within `threshold`.
///
/// `residual_fn(data, model, row)` measures one row, usually a transfer
/// distance in pixels. Rows at infinity or with NaN residuals are outliers.
pub struct RansacInlierCountScoring<M, F>
where
    F: Fn(&DataMatrix, &M, usize) -> f64,
{
    threshold: f64,
    residual_fn: F,
    _marker: PhantomData<M>,
}

impl<M, F> RansacInlierCountScoring<M, F>
where
    F: Fn(&DataMatrix, &M, usize) -> f64,
{
    pub fn new(threshold: f64, residual_fn: F) -> Self {
        Self {
            threshold,
            residual_fn,
            _marker: PhantomData,
        }
    }
}

impl<M, F> Scoring<M> for RansacInlierCountScoring<M, F>
where
    F: Fn(&DataMatrix, &M, usize) -> f64,
{
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self, data: &DataMatrix, model: &M, inliers_out: &mut Vec<usize>) -> Score {
        inliers_out.clear();
        for i in 0..data.nrows() {
            let r = (self.residual_fn)(data, model, i);
            if r.is_finite() && r <= self.threshold {
                inliers_out.push(i);
            }
        }
        Score::new(inliers_out.len())
    }
}

/// One-directional transfer distance `|H·src - dst|` of row `idx`.
pub fn homography_transfer_residual(data: &DataMatrix, model: &Homography, idx: usize) -> f64 {
    let src = Point2D::new(data[(idx, 0)], data[(idx, 1)]);
    let dst = Point2D::new(data[(idx, 2)], data[(idx, 3)]);
    transfer_distance(model, &src, &dst)
}

pub type HomographyResidualFn = fn(&DataMatrix, &Homography, usize) -> f64;

/// Inlier-count scoring of homographies by transfer distance.
pub fn homography_scoring(
    threshold: f64,
) -> RansacInlierCountScoring<Homography, HomographyResidualFn> {
    RansacInlierCountScoring::new(
        threshold,
        homography_transfer_residual as HomographyResidualFn,
    )
}
