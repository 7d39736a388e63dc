//! Integration tests for the public stitching API.
//!
//! All data is synthetic: correspondences come from known homographies and
//! images are crops of a smooth procedural scene, so every expected value is
//! known exactly.

use approx::assert_relative_eq;
use image::Rgb;
use nalgebra::Matrix3;
use panostitch::correspondence::{from_fn, CachedSource, PairRequest, PointCache};
use panostitch::core::Support;
use panostitch::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn perspective() -> Homography {
    Homography::new(Matrix3::new(
        0.92, 0.07, 48.0, -0.05, 1.03, -6.0, 2e-4, 1e-4, 1.0,
    ))
}

/// `n_inliers` exact correspondences of `h` followed by `n_outliers` pairs
/// displaced by at least 40 pixels.
fn contaminated(h: &Homography, n_inliers: usize, n_outliers: usize) -> CorrespondenceSet {
    let mut rng = StdRng::seed_from_u64(11);
    let mut src = Vec::new();
    let mut dst = Vec::new();
    for i in 0..n_inliers {
        let p = Point2D::new((i % 8) as f64 * 37.0 + 4.0, (i / 8) as f64 * 29.0 + 9.0);
        dst.push(h.apply(&p).unwrap());
        src.push(p);
    }
    for _ in 0..n_outliers {
        let p = Point2D::new(rng.gen_range(0.0..300.0), rng.gen_range(0.0..200.0));
        let mapped = h.apply(&p).unwrap();
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let du = sign * rng.gen_range(40.0..150.0);
        let dv = rng.gen_range(-150.0..150.0);
        dst.push(Point2D::new(mapped.x + du, mapped.y + dv));
        src.push(p);
    }
    CorrespondenceSet::new(src, dst).unwrap()
}

fn scene(x: u32, y: u32) -> Rgb<f32> {
    let (x, y) = (x as f32, y as f32);
    Rgb([
        0.5 + 0.4 * (x * 0.15).sin(),
        0.5 + 0.4 * (y * 0.2).cos(),
        0.5 + 0.3 * ((x + y) * 0.07).sin(),
    ])
}

/// Crop of the scene starting at column `u0`.
fn view(u0: u32, width: u32, height: u32) -> Image {
    Image::from_fn(width, height, |x, y| scene(x + u0, y))
}

/// Correspondences for a view that starts `du` columns left of its partner.
fn horizontal_shift(du: f64, u_lo: f64) -> CorrespondenceSet {
    let mut src = Vec::new();
    let mut dst = Vec::new();
    for k in 0..5 {
        for v in [3.0, 14.0, 26.0, 35.0] {
            let u = u_lo + 4.0 * k as f64;
            src.push((u, v));
            dst.push((u - du, v));
        }
    }
    CorrespondenceSet::from_pairs(&src, &dst).unwrap()
}

fn seeded(seed: u64) -> StitchSettings {
    StitchSettings {
        ransac: RansacSettings {
            iterations: 300,
            seed: Some(seed),
            ..RansacSettings::default()
        },
        ..StitchSettings::default()
    }
}

fn assert_matches_scene(image: &Image, width: u32, height: u32) {
    for y in 0..height {
        for x in 0..width {
            let got = image.get_pixel(x, y).0;
            let want = scene(x, y).0;
            for c in 0..3 {
                assert_relative_eq!(got[c], want[c], epsilon = 1e-3);
            }
        }
    }
}

#[test]
fn test_estimate_homography_scale_scenario() {
    let pairs = CorrespondenceSet::from_pairs(
        &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
        &[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)],
    )
    .unwrap();

    let result = estimate_homography(&pairs, &seeded(1).ransac).unwrap();
    assert_eq!(result.inliers.len(), 4);
    assert_relative_eq!(
        *result.homography.matrix(),
        Matrix3::new(2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0),
        epsilon = 1e-9
    );
    let mid = result.homography.apply(&Point2D::new(5.0, 5.0)).unwrap();
    assert_relative_eq!(mid, Point2D::new(10.0, 10.0), epsilon = 1e-9);
}

#[test]
fn test_ransac_recovers_homography_despite_outliers() {
    let truth = perspective();
    let pairs = contaminated(&truth, 40, 15);

    let result = estimate_homography(&pairs, &seeded(42).ransac).unwrap();

    assert_eq!(result.inliers.support, Support::Consensus);
    assert!(result.inliers.len() >= 40);
    assert!(result.inliers.indices.iter().all(|&i| i < 40));
    assert_relative_eq!(*result.homography.matrix(), *truth.matrix(), epsilon = 1e-6);
}

#[test]
fn test_exact_data_keeps_every_point() {
    let pairs = contaminated(&perspective(), 24, 0);
    let inliers = fit_inliers(&pairs, &seeded(5).ransac).unwrap();
    assert_eq!(inliers.len(), 24);
    assert_eq!(inliers.correspondences, pairs.subset(&inliers.indices));
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let pairs = contaminated(&perspective(), 20, 20);
    let settings = RansacSettings {
        iterations: 40,
        seed: Some(2024),
        ..RansacSettings::default()
    };

    let first = fit_inliers(&pairs, &settings).unwrap();
    let second = fit_inliers(&pairs, &settings).unwrap();
    assert_eq!(first.indices, second.indices);
}

#[test]
fn test_sample_larger_than_data_is_rejected() {
    let pairs = CorrespondenceSet::from_pairs(
        &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
        &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
    )
    .unwrap();
    assert!(matches!(
        fit_inliers(&pairs, &RansacSettings::default()),
        Err(StitchError::OutOfRangeSample {
            requested: 4,
            available: 3
        })
    ));
}

#[test]
fn test_stitch_pair_reconstructs_scene() {
    let a = view(0, 60, 40);
    let b = view(40, 60, 40);
    let settings = StitchSettings {
        canvas_margin: None,
        ..seeded(3)
    };

    let stitch = Stitcher::new(settings)
        .stitch_pair(&a, &b, &horizontal_shift(40.0, 42.0))
        .unwrap();

    assert_eq!(stitch.offset, CanvasOffset { min_u: -40, min_v: 0 });
    assert_eq!(stitch.canvas.dimensions(), (120, 80));
    assert_matches_scene(&stitch.canvas, 100, 40);
}

#[test]
fn test_stitch_many_chains_through_the_composite() {
    let images = vec![
        LabeledImage::new("a", view(0, 60, 40)),
        LabeledImage::new("b", view(40, 60, 40)),
        LabeledImage::new("c", view(80, 60, 40)),
    ];
    let mut lefts = Vec::new();
    let mut source = from_fn(|req: &PairRequest<'_>| {
        lefts.push(req.left_id.to_string());
        let du = 40.0 * (req.stage + 1) as f64;
        Ok(horizontal_shift(du, du + 2.0))
    });

    let panorama = Stitcher::new(seeded(8))
        .stitch_many(&images, &mut source)
        .unwrap();
    drop(source);

    assert_eq!(lefts, ["a", "a+b"]);
    assert_eq!(panorama.dimensions(), (180, 120));
    assert_matches_scene(&panorama, 140, 40);
}

#[test]
fn test_cached_source_replays_points() {
    let dir = tempfile::tempdir().unwrap();
    let images = vec![
        LabeledImage::new("a", view(0, 60, 40)),
        LabeledImage::new("b", view(40, 60, 40)),
    ];
    let stitcher = Stitcher::new(seeded(4));

    let mut fresh = CachedSource::new(
        PointCache::new(dir.path()),
        from_fn(|_: &PairRequest<'_>| Ok(horizontal_shift(40.0, 42.0))),
    );
    let first = stitcher.stitch_many(&images, &mut fresh).unwrap();

    let mut replay = CachedSource::new(
        PointCache::new(dir.path()),
        from_fn(|_: &PairRequest<'_>| -> Result<CorrespondenceSet> {
            panic!("cache should serve every stage")
        }),
    );
    let second = stitcher.stitch_many(&images, &mut replay).unwrap();

    assert_eq!(first, second);
}
