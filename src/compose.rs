//! Placement of a warped image and its reference on a shared canvas.

use image::imageops;
use tracing::debug;

use crate::settings::CanvasMargin;
use crate::types::Image;
use crate::warp::WarpedImage;

/// Composites a warped image with the untouched reference it was warped onto.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor {
    /// Crop margin beyond the larger input; `None` keeps the whole canvas.
    pub margin: Option<CanvasMargin>,
}

impl Compositor {
    pub fn new(margin: Option<CanvasMargin>) -> Self {
        Self { margin }
    }

    /// Place `warped` and `reference` on a zero canvas.
    ///
    /// A negative warp offset shifts the reference right/down by the same
    /// amount, a positive one shifts the warped image. The reference is drawn
    /// last and wins where the two overlap. `source_dims` are the dimensions
    /// of the image before warping and only enter the crop size.
    ///
    /// The canvas is at least `(warped.w + ref.w, warped.h + ref.h)` and grows
    /// when an offset places either image beyond that.
    pub fn compose(&self, warped: &WarpedImage, source_dims: (u32, u32), reference: &Image) -> Image {
        let (ww, wh) = warped.image.dimensions();
        let (rw, rh) = reference.dimensions();
        let offset = warped.offset;
        let width = canvas_extent(offset.min_u, ww, rw);
        let height = canvas_extent(offset.min_v, wh, rh);
        let mut canvas = Image::new(width, height);

        imageops::replace(
            &mut canvas,
            &warped.image,
            offset.min_u.max(0),
            offset.min_v.max(0),
        );
        imageops::replace(
            &mut canvas,
            reference,
            (-offset.min_u).max(0),
            (-offset.min_v).max(0),
        );

        let Some(margin) = self.margin else {
            return canvas;
        };
        let crop_w = (source_dims.0.max(rw).saturating_add(margin.u)).min(canvas.width());
        let crop_h = (source_dims.1.max(rh).saturating_add(margin.v)).min(canvas.height());
        debug!(
            canvas_w = canvas.width(),
            canvas_h = canvas.height(),
            crop_w,
            crop_h,
            "cropping composite"
        );
        imageops::crop_imm(&canvas, 0, 0, crop_w, crop_h).to_image()
    }
}

/// Canvas length along one axis holding a warped image of length `warped`
/// at `offset` and a reference of length `reference` at `-offset`.
fn canvas_extent(offset: i64, warped: u32, reference: u32) -> u32 {
    let warped_end = offset.max(0) + warped as i64;
    let reference_end = (-offset).max(0) + reference as i64;
    let extent = (warped as i64 + reference as i64)
        .max(warped_end)
        .max(reference_end);
    extent.min(u32::MAX as i64) as u32
}
