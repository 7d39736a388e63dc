//! Applying homographies to points.
//!
//! Points are lifted to homogeneous form `[u, v, 1]`, multiplied by `H` and
//! brought back with a perspective divide. A point whose third homogeneous
//! component vanishes maps to infinity; such points come back as `None` and
//! are skipped by distance and bounding-box computations.

use nalgebra::Vector3;

use crate::models::Homography;
use crate::types::Point2D;

/// Homogeneous scale below which a point is considered to be at infinity.
const MIN_HOMOGENEOUS_SCALE: f64 = 1e-12;

/// Map one point through `h`.
#[inline]
pub fn transform_point(h: &Homography, p: &Point2D) -> Option<Point2D> {
    let q = h.matrix() * Vector3::new(p.x, p.y, 1.0);
    if q.z.abs() <= MIN_HOMOGENEOUS_SCALE {
        return None;
    }
    let mapped = Point2D::new(q.x / q.z, q.y / q.z);
    (mapped.x.is_finite() && mapped.y.is_finite()).then_some(mapped)
}

/// Map a batch of points; output positions line up with the input.
pub fn transform_points(points: &[Point2D], h: &Homography) -> Vec<Option<Point2D>> {
    points.iter().map(|p| transform_point(h, p)).collect()
}

/// Euclidean distance between `h(src)` and `dst`.
///
/// Points mapped to infinity report `f64::INFINITY`, which never passes an
/// inlier threshold.
#[inline]
pub fn transfer_distance(h: &Homography, src: &Point2D, dst: &Point2D) -> f64 {
    match transform_point(h, src) {
        Some(mapped) => (mapped - *dst).norm(),
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    fn sample_points() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(12.5, -3.0),
            Point2D::new(640.0, 480.0),
            Point2D::new(-20.0, 75.25),
        ]
    }

    #[test]
    fn identity_leaves_points_unchanged() {
        let points = sample_points();
        let mapped = transform_points(&points, &Homography::identity());
        for (p, q) in points.iter().zip(mapped.iter()) {
            assert_eq!(Some(*p), *q);
        }
    }

    #[test]
    fn forward_then_inverse_returns_original() {
        let h = Homography::new(Matrix3::new(
            0.9, -0.2, 30.0, 0.15, 1.1, -12.0, 2e-4, 1e-4, 1.0,
        ));
        let inv = h.inverse().unwrap();

        for p in sample_points() {
            let q = transform_point(&h, &p).unwrap();
            let back = transform_point(&inv, &q).unwrap();
            assert_relative_eq!(back, p, epsilon = 1e-8);
        }
    }

    #[test]
    fn scale_maps_midpoint() {
        let h = Homography::new(Matrix3::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0));
        let q = transform_point(&h, &Point2D::new(5.0, 5.0)).unwrap();
        assert_relative_eq!(q, Point2D::new(10.0, 10.0));
    }

    #[test]
    fn points_on_the_horizon_map_to_none() {
        // w = 1 - 0.01 * u vanishes at u = 100.
        let h = Homography::new(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -0.01, 0.0, 1.0));
        let mapped = transform_points(&[Point2D::new(100.0, 3.0), Point2D::new(50.0, 3.0)], &h);
        assert!(mapped[0].is_none());
        assert!(mapped[1].is_some());

        let d = transfer_distance(&h, &Point2D::new(100.0, 3.0), &Point2D::new(0.0, 0.0));
        assert!(d.is_infinite());
    }
}
