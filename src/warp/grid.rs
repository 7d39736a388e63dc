//! Integer coordinate grids mapped through a homography.

use std::ops::Range;

use crate::models::Homography;
use crate::transform::transform_point;
use crate::types::Point2D;

/// A row-major grid of points and their images under a homography.
#[derive(Debug, Clone, Default)]
pub struct WarpedGrid {
    /// Grid points, `v` outer and `u` inner.
    pub points: Vec<Point2D>,
    /// `mapped[i]` is the image of `points[i]`, `None` at infinity.
    pub mapped: Vec<Option<Point2D>>,
}

impl WarpedGrid {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis-aligned extent of the finite mapped points of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    pub min_u: f64,
    pub max_u: f64,
    pub min_v: f64,
    pub max_v: f64,
}

impl GridBounds {
    fn around(p: Point2D) -> Self {
        Self {
            min_u: p.x,
            max_u: p.x,
            min_v: p.y,
            max_v: p.y,
        }
    }

    fn include(mut self, p: Point2D) -> Self {
        self.min_u = self.min_u.min(p.x);
        self.max_u = self.max_u.max(p.x);
        self.min_v = self.min_v.min(p.y);
        self.max_v = self.max_v.max(p.y);
        self
    }
}

fn grid_points(u_range: Range<i64>, v_range: Range<i64>) -> impl Iterator<Item = Point2D> {
    v_range.flat_map(move |v| {
        u_range
            .clone()
            .map(move |u| Point2D::new(u as f64, v as f64))
    })
}

/// Cartesian product `u_range x v_range` in row-major order, mapped by `h`.
pub fn grid(u_range: Range<i64>, v_range: Range<i64>, h: &Homography) -> WarpedGrid {
    let points: Vec<Point2D> = grid_points(u_range, v_range).collect();
    let mapped = points.iter().map(|p| transform_point(h, p)).collect();
    WarpedGrid { points, mapped }
}

/// Bounds of the grid mapped by `h`, computed without materializing it.
///
/// Points at infinity are skipped; `None` if no point maps to a finite
/// location.
pub fn grid_bounds(u_range: Range<i64>, v_range: Range<i64>, h: &Homography) -> Option<GridBounds> {
    grid_points(u_range, v_range)
        .filter_map(|p| transform_point(h, &p))
        .fold(None, |acc: Option<GridBounds>, p| {
            Some(match acc {
                Some(bounds) => bounds.include(p),
                None => GridBounds::around(p),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    #[test]
    fn grid_is_row_major() {
        let g = grid(0..3, 10..12, &Homography::identity());
        assert_eq!(g.len(), 6);
        assert_eq!(g.points[0], Point2D::new(0.0, 10.0));
        assert_eq!(g.points[2], Point2D::new(2.0, 10.0));
        assert_eq!(g.points[3], Point2D::new(0.0, 11.0));
        assert_eq!(g.mapped[4], Some(Point2D::new(1.0, 11.0)));
    }

    #[test]
    fn bounds_follow_translation() {
        let h = Homography::translation(-5.5, 3.25);
        let b = grid_bounds(0..10, 0..4, &h).unwrap();
        assert_eq!(
            b,
            GridBounds {
                min_u: -5.5,
                max_u: 3.5,
                min_v: 3.25,
                max_v: 6.25
            }
        );
    }

    #[test]
    fn bounds_skip_points_at_infinity() {
        // w = 1 - u / 4 vanishes on the column u = 4.
        let h = Homography::new(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -0.25, 0.0, 1.0));
        let g = grid(3..6, 0..1, &h);
        assert!(g.mapped[1].is_none());

        let b = grid_bounds(4..5, 0..3, &h);
        assert!(b.is_none());
        assert!(grid_bounds(3..6, 0..2, &h).is_some());
    }

    #[test]
    fn empty_ranges_give_empty_grid() {
        let g = grid(0..0, 0..5, &Homography::identity());
        assert!(g.is_empty());
        assert!(grid_bounds(0..0, 0..5, &Homography::identity()).is_none());
    }
}
