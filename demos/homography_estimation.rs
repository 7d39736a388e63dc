//! Example: robust homography estimation from contaminated correspondences
//!
//! Generates matches under a known perspective homography, replaces some of
//! them with gross mismatches and recovers the homography with RANSAC.

use nalgebra::Matrix3;
use panostitch::*;
use rand::Rng;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== Homography Estimation Example ===\n");

    let truth = Homography::new(Matrix3::new(
        0.95, -0.04, 120.0, 0.03, 1.01, -8.0, 1.5e-4, -5e-5, 1.0,
    ));
    let n_points = 60;
    let n_outliers = 25;

    let mut rng = rand::thread_rng();
    let mut src = Vec::with_capacity(n_points + n_outliers);
    let mut dst = Vec::with_capacity(n_points + n_outliers);

    for _ in 0..n_points {
        let p = Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0));
        let Some(q) = truth.apply(&p) else { continue };
        src.push(p);
        // Sub-pixel localisation noise.
        dst.push(Point2D::new(
            q.x + rng.gen_range(-0.3..0.3),
            q.y + rng.gen_range(-0.3..0.3),
        ));
    }
    for _ in 0..n_outliers {
        src.push(Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)));
        dst.push(Point2D::new(rng.gen_range(0.0..760.0), rng.gen_range(0.0..480.0)));
    }
    let pairs = CorrespondenceSet::new(src, dst)?;

    println!("Generated {} inliers and {} outliers\n", n_points, n_outliers);

    let settings = RansacSettings {
        inlier_distance: 1.5,
        ..RansacSettings::default()
    };
    let result = estimate_homography(&pairs, &settings)?;

    println!("Estimation results:");
    println!(
        "  Found {} inliers out of {} pairs ({:?})",
        result.inliers.len(),
        pairs.len(),
        result.inliers.support
    );
    let correct = result.inliers.indices.iter().filter(|&&i| i < n_points).count();
    println!("  {} of them are true inliers", correct);

    println!("\nEstimated homography matrix:");
    let h = result.homography.matrix();
    for i in 0..3 {
        println!("  [{:10.6}, {:10.6}, {:10.4}]", h[(i, 0)], h[(i, 1)], h[(i, 2)]);
    }
    println!("\nTrue homography matrix:");
    let t = truth.matrix();
    for i in 0..3 {
        println!("  [{:10.6}, {:10.6}, {:10.4}]", t[(i, 0)], t[(i, 1)], t[(i, 2)]);
    }

    let center = Point2D::new(320.0, 240.0);
    if let (Some(a), Some(b)) = (result.homography.apply(&center), truth.apply(&center)) {
        println!("\nImage centre maps to ({:.2}, {:.2}), truth ({:.2}, {:.2})", a.x, a.y, b.x, b.y);
    }

    Ok(())
}
