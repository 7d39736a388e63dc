//! Homography estimator with h33 fixed to one.
//!
//! Every correspondence `(x, y) -> (x', y')` contributes two rows of an
//! inhomogeneous system in the eight remaining entries:
//!
//! ```text
//! [ x  y  1  0  0  0  -x·x'  -y·x' ] h = x'
//! [ 0  0  0  x  y  1  -x·y'  -y·y' ] h = y'
//! ```
//!
//! Four correspondences are solved exactly with Gaussian elimination, more
//! in the least-squares sense through an SVD.

use nalgebra::{DMatrix, DVector, Matrix3};

use crate::core::Estimator;
use crate::error::{Result, StitchError};
use crate::models::Homography;
use crate::types::{CorrespondenceSet, DataMatrix, Point2D};
use crate::utils::gauss_elimination;

/// Number of correspondences of a minimal sample.
pub const MINIMAL_SAMPLE_SIZE: usize = 4;

/// Relative tolerance for collinearity and rank tests.
const DEGENERACY_EPS: f64 = 1e-9;

/// Homography estimator: exact for four points, least squares beyond.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyEstimator;

impl HomographyEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate the homography mapping `correspondences.src()` onto
    /// `correspondences.dst()`.
    pub fn estimate(&self, correspondences: &CorrespondenceSet) -> Result<Homography> {
        solve(correspondences.src(), correspondences.dst())
    }
}

impl Estimator for HomographyEstimator {
    type Model = Homography;

    fn sample_size(&self) -> usize {
        MINIMAL_SAMPLE_SIZE
    }

    fn is_valid_sample(&self, data: &DataMatrix, sample: &[usize]) -> bool {
        if sample.len() < MINIMAL_SAMPLE_SIZE {
            return false;
        }
        for i in 0..sample.len() {
            for j in (i + 1)..sample.len() {
                if sample[i] == sample[j] {
                    return false;
                }
            }
        }
        let set = CorrespondenceSet::from_data_matrix(data, sample);
        check_geometry(set.src(), set.dst()).is_ok()
    }

    fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Result<Homography> {
        self.estimate(&CorrespondenceSet::from_data_matrix(data, sample))
    }
}

fn solve(src: &[Point2D], dst: &[Point2D]) -> Result<Homography> {
    let n = src.len();
    if n < MINIMAL_SAMPLE_SIZE {
        return Err(StitchError::degenerate(format!(
            "need at least {MINIMAL_SAMPLE_SIZE} correspondences, got {n}"
        )));
    }
    check_geometry(src, dst)?;

    let (coefficients, rhs) = build_system(src, dst);
    let h = if n == MINIMAL_SAMPLE_SIZE {
        solve_exact(coefficients, rhs)?
    } else {
        solve_least_squares(coefficients, rhs)?
    };

    if h.iter().any(|v| !v.is_finite()) {
        return Err(StitchError::degenerate("solution is not finite"));
    }

    let h_mat = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    Ok(Homography::new(h_mat))
}

/// Build the `2N x 8` coefficient matrix and the `2N` right-hand side.
fn build_system(src: &[Point2D], dst: &[Point2D]) -> (DMatrix<f64>, DVector<f64>) {
    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 8);
    let mut b = DVector::<f64>::zeros(2 * n);

    for (i, (s, t)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s.x, s.y);
        let (xt, yt) = (t.x, t.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -x * xt;
        a[(r0, 7)] = -y * xt;
        b[r0] = xt;

        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -x * yt;
        a[(r1, 7)] = -y * yt;
        b[r1] = yt;
    }

    (a, b)
}

fn solve_exact(a: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>> {
    let mut augmented = a.insert_column(8, 0.0);
    augmented.set_column(8, &b);
    gauss_elimination(augmented)
        .ok_or_else(|| StitchError::degenerate("estimation matrix is singular"))
}

fn solve_least_squares(a: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>> {
    let svd = a.svd(true, true);
    let max_sv = svd.singular_values.max();
    let tol = max_sv * DEGENERACY_EPS;
    if max_sv <= 0.0 || svd.rank(tol) < 8 {
        return Err(StitchError::degenerate("estimation matrix is rank deficient"));
    }
    svd.solve(&b, tol)
        .map_err(|e| StitchError::degenerate(format!("least-squares solve failed: {e}")))
}

/// Reject point layouts from which no unique homography follows.
fn check_geometry(src: &[Point2D], dst: &[Point2D]) -> Result<()> {
    for (label, pts) in [("source", src), ("target", dst)] {
        if all_collinear(pts) {
            return Err(StitchError::degenerate(format!("{label} points are collinear")));
        }
        if pts.len() == MINIMAL_SAMPLE_SIZE && has_collinear_triple(pts) {
            return Err(StitchError::degenerate(format!(
                "three of the four {label} points are collinear"
            )));
        }
    }
    Ok(())
}

/// Twice the signed area of the triangle `(a, b, c)`, scaled by the longest
/// side so the test does not depend on the pixel scale.
fn normalized_area(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    let ab = b - a;
    let ac = c - a;
    let cross = ab.x * ac.y - ab.y * ac.x;
    let scale = ab.norm_squared().max(ac.norm_squared()).max((c - b).norm_squared());
    if scale == 0.0 {
        0.0
    } else {
        cross / scale
    }
}

fn has_collinear_triple(pts: &[Point2D]) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if normalized_area(&pts[i], &pts[j], &pts[k]).abs() < DEGENERACY_EPS {
                    return true;
                }
            }
        }
    }
    false
}

fn all_collinear(pts: &[Point2D]) -> bool {
    let Some(first) = pts.first() else {
        return true;
    };
    // Anchor the line on the point farthest from the first one.
    let Some(far) = pts
        .iter()
        .max_by(|p, q| (*p - first).norm_squared().total_cmp(&(*q - first).norm_squared()))
    else {
        return true;
    };
    if (far - first).norm_squared() == 0.0 {
        return true;
    }
    pts.iter()
        .all(|p| normalized_area(first, far, p).abs() < DEGENERACY_EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform_point;
    use approx::assert_relative_eq;

    fn square_to_scaled_square() -> CorrespondenceSet {
        CorrespondenceSet::from_pairs(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            &[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)],
        )
        .unwrap()
    }

    fn perspective() -> Homography {
        Homography::new(Matrix3::new(
            1.05, 0.12, 35.0, -0.08, 0.97, 12.0, 3e-4, -1e-4, 1.0,
        ))
    }

    #[test]
    fn pure_scale_is_recovered() {
        let h = HomographyEstimator::new()
            .estimate(&square_to_scaled_square())
            .unwrap();
        assert_relative_eq!(
            *h.matrix(),
            Matrix3::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0),
            epsilon = 1e-9
        );

        let mid = transform_point(&h, &Point2D::new(5.0, 5.0)).unwrap();
        assert_relative_eq!(mid, Point2D::new(10.0, 10.0), epsilon = 1e-9);
    }

    #[test]
    fn minimal_sample_reproduces_targets() {
        let truth = perspective();
        let src = [
            Point2D::new(3.0, 7.0),
            Point2D::new(410.0, 22.0),
            Point2D::new(395.0, 300.0),
            Point2D::new(15.0, 280.0),
        ];
        let dst: Vec<Point2D> = src.iter().map(|p| truth.apply(p).unwrap()).collect();
        let set = CorrespondenceSet::new(src.to_vec(), dst.clone()).unwrap();

        let h = HomographyEstimator::new().estimate(&set).unwrap();
        for (s, t) in src.iter().zip(dst.iter()) {
            assert_relative_eq!(h.apply(s).unwrap(), *t, epsilon = 1e-6);
        }
    }

    #[test]
    fn least_squares_recovers_true_homography() {
        let truth = perspective();
        let mut src = Vec::new();
        for v in 0..5 {
            for u in 0..6 {
                src.push(Point2D::new(u as f64 * 60.0 + 5.0, v as f64 * 45.0 + 3.0));
            }
        }
        let dst: Vec<Point2D> = src.iter().map(|p| truth.apply(p).unwrap()).collect();
        let set = CorrespondenceSet::new(src, dst).unwrap();

        let h = HomographyEstimator::new().estimate(&set).unwrap();
        assert_relative_eq!(*h.matrix(), *truth.matrix(), epsilon = 1e-6);
    }

    #[test]
    fn too_few_points_are_degenerate() {
        let set = CorrespondenceSet::from_pairs(
            &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
            &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
        )
        .unwrap();
        assert!(matches!(
            HomographyEstimator::new().estimate(&set),
            Err(StitchError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let set = CorrespondenceSet::from_pairs(
            &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)],
            &[(0.0, 0.0), (2.0, 1.0), (4.0, 0.0), (6.0, 2.0), (8.0, 1.0)],
        )
        .unwrap();
        assert!(matches!(
            HomographyEstimator::new().estimate(&set),
            Err(StitchError::DegenerateInput { .. })
        ));

        let triple = CorrespondenceSet::from_pairs(
            &[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (0.0, 10.0)],
            &[(0.0, 0.0), (5.0, 0.0), (10.0, 1.0), (0.0, 10.0)],
        )
        .unwrap();
        assert!(HomographyEstimator::new().estimate(&triple).is_err());
    }

    #[test]
    fn estimator_trait_validates_samples() {
        let data = square_to_scaled_square().to_data_matrix();
        let estimator = HomographyEstimator::new();

        assert!(estimator.is_valid_sample(&data, &[0, 1, 2, 3]));
        assert!(!estimator.is_valid_sample(&data, &[0, 1, 2, 2]));
        assert!(!estimator.is_valid_sample(&data, &[0, 1, 2]));

        let h = estimator.estimate_model(&data, &[3, 2, 1, 0]).unwrap();
        assert_relative_eq!(h.matrix()[(0, 0)], 2.0, epsilon = 1e-9);
    }
}
