//! Example: stitching three synthetic views into a panorama
//!
//! Renders three overlapping crops of a procedural scene, derives exact
//! correspondences for each stage and writes the stitched result to
//! `synthetic_panorama.png` (or the path given as the first argument).

use image::Rgb;
use panostitch::correspondence::{from_fn, PairRequest};
use panostitch::io::save_image;
use panostitch::*;

const VIEW_W: u32 = 240;
const VIEW_H: u32 = 160;
const STEP: u32 = 160;

fn scene(x: u32, y: u32) -> Rgb<f32> {
    let (x, y) = (x as f32, y as f32);
    let stripes = 0.5 + 0.5 * (x * 0.09).sin() * (y * 0.05).cos();
    let rings = 0.5 + 0.5 * ((x - 300.0).hypot(y - 80.0) * 0.12).sin();
    Rgb([stripes, rings, 0.5 + 0.4 * ((x + 2.0 * y) * 0.02).sin()])
}

fn view(index: u32) -> Image {
    let u0 = index * STEP;
    Image::from_fn(VIEW_W, VIEW_H, |x, y| scene(x + u0, y))
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let out = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "synthetic_panorama.png".to_string());

    let images: Vec<LabeledImage> = (0..3)
        .map(|i| LabeledImage::new(format!("view{i}"), view(i)))
        .collect();

    // The composite after stage k starts at scene column 0 and view k + 1
    // starts at (k + 1) * STEP, so matches differ by a pure shift.
    let mut source = from_fn(|req: &PairRequest<'_>| {
        let du = ((req.stage as u32 + 1) * STEP) as f64;
        let mut src = Vec::new();
        let mut dst = Vec::new();
        for i in 0..req.count {
            let u = du + 5.0 + (i % 10) as f64 * 7.0;
            let v = 5.0 + (i / 10) as f64 * 13.0 % (VIEW_H as f64 - 10.0);
            src.push(Point2D::new(u, v));
            dst.push(Point2D::new(u - du, v));
        }
        CorrespondenceSet::new(src, dst)
    });

    let settings = StitchSettings {
        correspondence_count: 60,
        ..StitchSettings::default()
    };
    let panorama = Stitcher::new(settings).stitch_many(&images, &mut source)?;

    save_image(&out, &panorama)?;
    println!(
        "Stitched {} views into a {}x{} panorama: {}",
        images.len(),
        panorama.width(),
        panorama.height(),
        out
    );
    Ok(())
}
