//! Pairwise and sequential panorama stitching.

use tracing::{debug, error, info};

use crate::api::{estimate_homography, InlierSet};
use crate::compose::Compositor;
use crate::correspondence::{CorrespondenceSource, PairRequest};
use crate::error::{Result, StitchError};
use crate::models::Homography;
use crate::settings::StitchSettings;
use crate::types::{CanvasOffset, CorrespondenceSet, Image, LabeledImage};
use crate::warp::warp;

/// Everything produced by one pairwise stitch.
#[derive(Debug, Clone)]
pub struct PairStitch {
    /// Composite of the warped left image and the right image.
    pub canvas: Image,
    /// Left to right homography, refit on `inliers`.
    pub homography: Homography,
    pub inliers: InlierSet,
    /// Position of the warped left image relative to the canvas origin.
    pub offset: CanvasOffset,
}

/// Stitches images with the configured robust fit, warp and compositing.
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    pub settings: StitchSettings,
}

impl Stitcher {
    pub fn new(settings: StitchSettings) -> Self {
        Self { settings }
    }

    /// Warp `a` into the frame of `b` and composite the two.
    ///
    /// `correspondences.src()` lie in `a`, `correspondences.dst()` in `b`.
    pub fn stitch_pair(
        &self,
        a: &Image,
        b: &Image,
        correspondences: &CorrespondenceSet,
    ) -> Result<PairStitch> {
        self.settings.validate()?;

        let fit = estimate_homography(correspondences, &self.settings.ransac)?;
        debug!(
            inliers = fit.inliers.len(),
            total = correspondences.len(),
            "estimated pairwise homography"
        );

        let warped = warp(a, &fit.homography, &self.settings.warp)?;
        let canvas =
            Compositor::new(self.settings.canvas_margin).compose(&warped, a.dimensions(), b);

        Ok(PairStitch {
            canvas,
            homography: fit.homography,
            inliers: fit.inliers,
            offset: warped.offset,
        })
    }

    /// Chain pairwise stitches over `images` from left to right.
    ///
    /// The running composite is the left operand of every stage and is
    /// warped onto the next image, so errors accumulate along the chain.
    pub fn stitch_many<S>(&self, images: &[LabeledImage], source: &mut S) -> Result<Image>
    where
        S: CorrespondenceSource + ?Sized,
    {
        let Some((first, rest)) = images.split_first() else {
            return Err(StitchError::degenerate("no images to stitch"));
        };

        let mut composite_id = first.id.clone();
        let mut composite = first.image.clone();
        for (stage, next) in rest.iter().enumerate() {
            let request = PairRequest {
                stage,
                left_id: &composite_id,
                right_id: &next.id,
                left: &composite,
                right: &next.image,
                count: self.settings.correspondence_count,
            };

            let stitched = source
                .correspondences(&request)
                .and_then(|set| self.stitch_pair(&composite, &next.image, &set));
            let stitched = match stitched {
                Ok(stitched) => stitched,
                Err(e) => {
                    error!(stage, left = %composite_id, right = %next.id, "stitching failed: {e}");
                    return Err(e);
                }
            };

            let (w, h) = stitched.canvas.dimensions();
            info!(
                stage,
                left = %composite_id,
                right = %next.id,
                inliers = stitched.inliers.len(),
                width = w,
                height = h,
                "stitched pair"
            );
            composite_id = format!("{composite_id}+{}", next.id);
            composite = stitched.canvas;
        }

        Ok(composite)
    }
}
