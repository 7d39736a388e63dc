//! Image and correspondence file I/O.

use std::fs;
use std::path::Path;

use image::{DynamicImage, RgbImage};
use serde::Deserialize;

use crate::error::Result;
use crate::types::{CorrespondenceSet, Image, Point2D};

/// Decode any format the `image` crate supports into RGB `f32` in `[0, 1]`.
pub fn load_image(path: impl AsRef<Path>) -> Result<Image> {
    Ok(image::open(path)?.to_rgb32f())
}

/// Write `image` as 8-bit RGB; the format follows the file extension.
/// Channel values are clamped to `[0, 1]` first.
pub fn save_image(path: impl AsRef<Path>, image: &Image) -> Result<()> {
    let clamped = Image::from_fn(image.width(), image.height(), |x, y| {
        let mut p = *image.get_pixel(x, y);
        for c in p.0.iter_mut() {
            *c = if c.is_finite() { (*c).clamp(0.0, 1.0) } else { 0.0 };
        }
        p
    });
    let rgb8: RgbImage = DynamicImage::ImageRgb32F(clamped).to_rgb8();
    rgb8.save(path)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct StageFile {
    src: Vec<[f64; 2]>,
    dst: Vec<[f64; 2]>,
}

/// Read a JSON list of stages, each `{"src": [[u, v], ...], "dst": [...]}`.
pub fn load_correspondences(path: impl AsRef<Path>) -> Result<Vec<CorrespondenceSet>> {
    let raw = fs::read_to_string(path)?;
    parse_correspondences(&raw)
}

fn parse_correspondences(raw: &str) -> Result<Vec<CorrespondenceSet>> {
    let stages: Vec<StageFile> = serde_json::from_str(raw)?;
    let to_points = |pts: Vec<[f64; 2]>| -> Vec<Point2D> {
        pts.into_iter().map(|[u, v]| Point2D::new(u, v)).collect()
    };
    stages
        .into_iter()
        .map(|stage| CorrespondenceSet::new(to_points(stage.src), to_points(stage.dst)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StitchError;
    use approx::assert_relative_eq;
    use image::Rgb;

    #[test]
    fn parses_stage_list() {
        let stages = parse_correspondences(
            r#"[
                {"src": [[0, 0], [1.5, 2]], "dst": [[10, 0], [11.5, 2]]},
                {"src": [], "dst": []}
            ]"#,
        )
        .unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].src()[1], Point2D::new(1.5, 2.0));
        assert_eq!(stages[0].dst()[0], Point2D::new(10.0, 0.0));
        assert!(stages[1].is_empty());
    }

    #[test]
    fn unequal_stage_lengths_are_rejected() {
        let err = parse_correspondences(r#"[{"src": [[0, 0]], "dst": []}]"#).unwrap_err();
        assert!(matches!(err, StitchError::LengthMismatch { src: 1, dst: 0 }));
    }

    #[test]
    fn png_round_trip_quantizes_to_8_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = Image::from_fn(4, 3, |x, y| Rgb([x as f32 / 3.0, y as f32 / 2.0, 1.7]));

        save_image(&path, &img).unwrap();
        let back = load_image(&path).unwrap();

        assert_eq!(back.dimensions(), (4, 3));
        let p = back.get_pixel(3, 2).0;
        assert_relative_eq!(p[0], 1.0, epsilon = 1.0 / 255.0);
        assert_relative_eq!(p[1], 1.0, epsilon = 1.0 / 255.0);
        // Out-of-range values are clamped before quantizing.
        assert_relative_eq!(p[2], 1.0, epsilon = 1e-6);
        assert_relative_eq!(back.get_pixel(0, 0).0[0], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image(dir.path().join("missing.png")).is_err());
        assert!(matches!(
            load_correspondences(dir.path().join("missing.json")),
            Err(StitchError::Io(_))
        ));
    }
}
