//! High-level entry points for robust homography estimation.

use tracing::warn;

use crate::core::{RobustFitter, Support};
use crate::error::Result;
use crate::estimators::HomographyEstimator;
use crate::models::Homography;
use crate::samplers::UniformRandomSampler;
use crate::scoring::homography_scoring;
use crate::settings::RansacSettings;
use crate::types::CorrespondenceSet;

/// Subset of a correspondence set selected by the robust fit.
#[derive(Debug, Clone)]
pub struct InlierSet {
    /// Positions of the selected pairs in the input set.
    pub indices: Vec<usize>,
    /// The selected pairs themselves.
    pub correspondences: CorrespondenceSet,
    pub support: Support,
}

impl InlierSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Result of [`estimate_homography`].
#[derive(Debug, Clone)]
pub struct RobustHomography {
    /// Homography refit on all returned inliers.
    pub homography: Homography,
    pub inliers: InlierSet,
}

/// Separate inliers from mismatches with RANSAC.
///
/// # Arguments
/// * `correspondences` - Source/target point pairs
/// * `settings` - Loop parameters; `settings.seed` pins the sampler
///
/// # Returns
/// The best-supported subset. When no round produced a model the first
/// drawn sample is returned with [`Support::Degraded`].
pub fn fit_inliers(
    correspondences: &CorrespondenceSet,
    settings: &RansacSettings,
) -> Result<InlierSet> {
    let data = correspondences.to_data_matrix();
    let mut fitter = RobustFitter::new(
        settings.clone(),
        HomographyEstimator::new(),
        UniformRandomSampler::with_seed(settings.seed),
        homography_scoring(settings.inlier_distance),
    );

    let outcome = fitter.run(&data)?;
    Ok(InlierSet {
        correspondences: correspondences.subset(&outcome.inliers),
        indices: outcome.inliers,
        support: outcome.support,
    })
}

/// Robust fit followed by a least-squares homography on the inliers.
///
/// Estimation failures on the inlier set propagate; there is no fallback to
/// the identity.
pub fn estimate_homography(
    correspondences: &CorrespondenceSet,
    settings: &RansacSettings,
) -> Result<RobustHomography> {
    let inliers = fit_inliers(correspondences, settings)?;
    if inliers.support == Support::Degraded {
        warn!(
            inliers = inliers.len(),
            total = correspondences.len(),
            "estimating homography from a degraded inlier set"
        );
    }
    let homography = HomographyEstimator::new().estimate(&inliers.correspondences)?;
    Ok(RobustHomography {
        homography,
        inliers,
    })
}
