//! Core shared types.
//!
//! Points follow image conventions: `x` is the column (u) and `y` is the row
//! (v), with the origin at the top-left pixel. The robust-fit traits work on a
//! [`DataMatrix`] whose rows are `[u_src, v_src, u_dst, v_dst]`.

use nalgebra::{DMatrix, Point2};

use crate::error::{Result, StitchError};

/// A 2D point in pixel space.
pub type Point2D = Point2<f64>;

/// Dynamic matrix of `f64`; one correspondence per row.
pub type DataMatrix = DMatrix<f64>;

/// Dense RGB image with `f32` channels normalized to `[0, 1)`.
pub type Image = image::Rgb32FImage;

/// Two equally long point lists where `src[i]` and `dst[i]` observe the same
/// physical feature in two images.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrespondenceSet {
    src: Vec<Point2D>,
    dst: Vec<Point2D>,
}

impl CorrespondenceSet {
    pub fn new(src: Vec<Point2D>, dst: Vec<Point2D>) -> Result<Self> {
        if src.len() != dst.len() {
            return Err(StitchError::LengthMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        Ok(Self { src, dst })
    }

    /// Build a set from `(u, v)` tuples.
    pub fn from_pairs(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Result<Self> {
        let to_points = |pts: &[(f64, f64)]| -> Vec<Point2D> {
            pts.iter().map(|&(u, v)| Point2D::new(u, v)).collect()
        };
        Self::new(to_points(src), to_points(dst))
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn src(&self) -> &[Point2D] {
        &self.src
    }

    pub fn dst(&self) -> &[Point2D] {
        &self.dst
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&Point2D, &Point2D)> {
        self.src.iter().zip(self.dst.iter())
    }

    /// Keep only the correspondences at `indices`, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            src: indices.iter().map(|&i| self.src[i]).collect(),
            dst: indices.iter().map(|&i| self.dst[i]).collect(),
        }
    }

    pub fn to_data_matrix(&self) -> DataMatrix {
        let mut data = DataMatrix::zeros(self.len(), 4);
        for (i, (s, d)) in self.pairs().enumerate() {
            data[(i, 0)] = s.x;
            data[(i, 1)] = s.y;
            data[(i, 2)] = d.x;
            data[(i, 3)] = d.y;
        }
        data
    }

    /// Rebuild a set from the rows of a `[u_src, v_src, u_dst, v_dst]` matrix.
    pub fn from_data_matrix(data: &DataMatrix, rows: &[usize]) -> Self {
        Self {
            src: rows
                .iter()
                .map(|&r| Point2D::new(data[(r, 0)], data[(r, 1)]))
                .collect(),
            dst: rows
                .iter()
                .map(|&r| Point2D::new(data[(r, 2)], data[(r, 3)]))
                .collect(),
        }
    }
}

/// Integer translation of a warped image's `(0, 0)` pixel relative to the
/// canvas origin. Either component may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasOffset {
    pub min_u: i64,
    pub min_v: i64,
}

/// An image together with the identity used for caching and logging.
#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub id: String,
    pub image: Image,
}

impl LabeledImage {
    pub fn new(id: impl Into<String>, image: Image) -> Self {
        Self {
            id: id.into(),
            image,
        }
    }
}
