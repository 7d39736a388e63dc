//! Inverse-mapping image warps.
//!
//! The forward homography only decides the output extent: the source pixel
//! grid is mapped through `H` and its bounding box, rounded outwards, becomes
//! the output canvas. Every output pixel then pulls its value from the
//! fractional source coordinate given by `H⁻¹`, one channel at a time.

use tracing::debug;

use crate::error::{Result, StitchError};
use crate::models::Homography;
use crate::settings::WarpSettings;
use crate::types::{CanvasOffset, Image};
use crate::warp::grid::{grid, grid_bounds, WarpedGrid};
use crate::warp::interpolate::{Channel, ChannelInterpolant};

/// Bounds closer than this to an integer are taken as that integer before
/// rounding outwards.
const SNAP_EPS: f64 = 1e-6;

fn snap(x: f64) -> f64 {
    let r = x.round();
    if (x - r).abs() < SNAP_EPS {
        r
    } else {
        x
    }
}

/// A warped image and the canvas position of its `(0, 0)` pixel.
#[derive(Debug, Clone)]
pub struct WarpedImage {
    pub image: Image,
    pub offset: CanvasOffset,
}

/// Warp `image` by `h` using inverse mapping.
///
/// Output pixels whose source coordinate falls outside the image receive
/// whatever `settings.border` yields; with the default
/// [`BorderPolicy::Extend`](crate::settings::BorderPolicy::Extend) these are
/// edge-extended values rather than an error.
pub fn warp(image: &Image, h: &Homography, settings: &WarpSettings) -> Result<WarpedImage> {
    settings.validate()?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(StitchError::degenerate("cannot warp an empty image"));
    }

    let h_inv = h.inverse()?;

    let bounds = grid_bounds(0..width as i64, 0..height as i64, h)
        .ok_or(StitchError::SingularTransform)?;
    let min_u = snap(bounds.min_u).floor();
    let max_u = snap(bounds.max_u).ceil();
    let min_v = snap(bounds.min_v).floor();
    let max_v = snap(bounds.max_v).ceil();

    let out_w = max_u - min_u + 1.0;
    let out_h = max_v - min_v + 1.0;
    let limit = settings.max_canvas_pixels;
    if out_w * out_h > limit as f64 || out_w > u32::MAX as f64 || out_h > u32::MAX as f64 {
        return Err(StitchError::CanvasTooLarge {
            width: out_w as u64,
            height: out_h as u64,
            limit,
        });
    }

    let offset = CanvasOffset {
        min_u: min_u as i64,
        min_v: min_v as i64,
    };
    let (out_w, out_h) = (out_w as u32, out_h as u32);
    debug!(
        src_w = width,
        src_h = height,
        out_w,
        out_h,
        min_u = offset.min_u,
        min_v = offset.min_v,
        "warping image"
    );

    let interpolants: Vec<ChannelInterpolant> = Channel::ALL
        .iter()
        .map(|&c| ChannelInterpolant::fit(image, c, settings.interpolation, settings.border))
        .collect();

    let mut target = Image::new(out_w, out_h);
    let u_range = offset.min_u..offset.min_u + out_w as i64;
    for v in offset.min_v..offset.min_v + out_h as i64 {
        let row = grid(u_range.clone(), v..v + 1, &h_inv);
        for (&channel, interpolant) in Channel::ALL.iter().zip(interpolants.iter()) {
            interpolate_channel(
                &mut target,
                interpolant,
                channel,
                &row,
                offset,
                settings.batch_size,
            );
        }
    }

    Ok(WarpedImage {
        image: target,
        offset,
    })
}

/// Fill one channel of `target` from `interpolant` at the source coordinates
/// of `grid`, `batch_size` pixels at a time.
fn interpolate_channel(
    target: &mut Image,
    interpolant: &ChannelInterpolant,
    channel: Channel,
    grid: &WarpedGrid,
    offset: CanvasOffset,
    batch_size: usize,
) {
    let index = channel.index();
    let mut values = Vec::with_capacity(batch_size);
    for (points, mapped) in grid
        .points
        .chunks(batch_size)
        .zip(grid.mapped.chunks(batch_size))
    {
        interpolant.evaluate_batch(mapped, &mut values);
        for (p, &value) in points.iter().zip(values.iter()) {
            let x = (p.x as i64 - offset.min_u) as u32;
            let y = (p.y as i64 - offset.min_v) as u32;
            target.get_pixel_mut(x, y).0[index] = value;
        }
    }
}
