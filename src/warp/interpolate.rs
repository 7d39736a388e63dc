//! Continuous per-channel interpolants over an image's pixel grid.
//!
//! Bicubic interpolation uses the Keys cubic-convolution kernel with
//! `a = -0.5`. Its weights sum to one and it reproduces pixel values at
//! integer coordinates, so a constant image stays constant and an identity
//! warp is lossless.

use crate::settings::{BorderPolicy, Interpolation};
use crate::types::{Image, Point2D};

/// Keys kernel parameter.
const KEYS_A: f64 = -0.5;

/// Slack when deciding whether a coordinate lies inside the image.
const BOUNDS_EPS: f64 = 1e-6;

/// A color channel of an RGB image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// All channels, in storage order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Index of the channel within a pixel.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// One color channel of an image prepared for evaluation at fractional
/// coordinates.
#[derive(Debug, Clone)]
pub struct ChannelInterpolant {
    width: usize,
    height: usize,
    values: Vec<f32>,
    kind: Interpolation,
    border: BorderPolicy,
}

impl ChannelInterpolant {
    /// Copy `channel` of `image` into a dense plane.
    pub fn fit(image: &Image, channel: Channel, kind: Interpolation, border: BorderPolicy) -> Self {
        let index = channel.index();
        let values = image.pixels().map(|p| p.0[index]).collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            values,
            kind,
            border,
        }
    }

    /// Value at the fractional coordinate `p` (`x` = column, `y` = row).
    pub fn evaluate(&self, p: &Point2D) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        if let BorderPolicy::Constant(fill) = self.border {
            if !self.contains(p) {
                return fill;
            }
        }
        // Taps more than two pixels outside the image all read the edge.
        let x = p.x.clamp(-2.0, self.width as f64 + 1.0);
        let y = p.y.clamp(-2.0, self.height as f64 + 1.0);
        match self.kind {
            Interpolation::Nearest => self.at(x.round() as i64, y.round() as i64),
            Interpolation::Bilinear => self.bilinear(x, y),
            Interpolation::Bicubic => self.bicubic(x, y),
        }
    }

    /// Evaluate a batch of coordinates into `out`; `None` entries yield zero.
    pub fn evaluate_batch(&self, points: &[Option<Point2D>], out: &mut Vec<f32>) {
        out.clear();
        out.extend(
            points
                .iter()
                .map(|p| p.as_ref().map_or(0.0, |p| self.evaluate(p))),
        );
    }

    fn contains(&self, p: &Point2D) -> bool {
        p.x >= -BOUNDS_EPS
            && p.y >= -BOUNDS_EPS
            && p.x <= (self.width - 1) as f64 + BOUNDS_EPS
            && p.y <= (self.height - 1) as f64 + BOUNDS_EPS
    }

    /// Pixel value with indices clamped to the nearest edge.
    #[inline]
    fn at(&self, u: i64, v: i64) -> f32 {
        let u = u.clamp(0, self.width as i64 - 1) as usize;
        let v = v.clamp(0, self.height as i64 - 1) as usize;
        self.values[v * self.width + u]
    }

    fn bilinear(&self, x: f64, y: f64) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (u, v) = (x0 as i64, y0 as i64);

        let p00 = self.at(u, v) as f64;
        let p10 = self.at(u + 1, v) as f64;
        let p01 = self.at(u, v + 1) as f64;
        let p11 = self.at(u + 1, v + 1) as f64;

        let top = p00 * (1.0 - fx) + p10 * fx;
        let bottom = p01 * (1.0 - fx) + p11 * fx;
        (top * (1.0 - fy) + bottom * fy) as f32
    }

    fn bicubic(&self, x: f64, y: f64) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let wx = keys_weights(x - x0);
        let wy = keys_weights(y - y0);
        let (u, v) = (x0 as i64, y0 as i64);

        let mut sum = 0.0f64;
        for (j, wyj) in wy.iter().enumerate() {
            let row = v + j as i64 - 1;
            let mut row_sum = 0.0f64;
            for (i, wxi) in wx.iter().enumerate() {
                row_sum += wxi * self.at(u + i as i64 - 1, row) as f64;
            }
            sum += wyj * row_sum;
        }
        sum as f32
    }
}

/// Keys cubic-convolution kernel.
#[inline]
fn keys_kernel(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((KEYS_A + 2.0) * t - (KEYS_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((KEYS_A * t - 5.0 * KEYS_A) * t + 8.0 * KEYS_A) * t - 4.0 * KEYS_A
    } else {
        0.0
    }
}

/// Weights of the four taps at offsets `-1, 0, 1, 2` for a fraction `f`.
#[inline]
fn keys_weights(f: f64) -> [f64; 4] {
    [
        keys_kernel(f + 1.0),
        keys_kernel(f),
        keys_kernel(1.0 - f),
        keys_kernel(2.0 - f),
    ]
}
