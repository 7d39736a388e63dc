//! panostitch CLI: stitch an ordered list of overlapping images.

use clap::Parser;
use std::path::{Path, PathBuf};

use panostitch::correspondence::{CachedSource, PointCache, PrecomputedCorrespondences};
use panostitch::io::{load_correspondences, load_image, save_image};
use panostitch::{LabeledImage, StitchSettings, Stitcher};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(name = "panostitch")]
#[command(about = "Stitch overlapping images, left to right, into one panorama")]
#[command(version)]
struct Cli {
    /// Input images in stitching order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output image path; the format follows the extension.
    #[arg(long, default_value = "panorama.png")]
    out: PathBuf,

    /// JSON list of per-stage correspondences (`[{"src": [[u, v], ...], "dst": [...]}]`).
    #[arg(long)]
    points: Option<PathBuf>,

    /// Directory caching picked points per image.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// JSON stitch settings; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RANSAC rounds.
    #[arg(long)]
    iterations: Option<usize>,

    /// RANSAC inlier distance in pixels.
    #[arg(long)]
    inlier_distance: Option<f64>,

    /// Fixed RANSAC seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Correspondences requested per image pair.
    #[arg(long)]
    count: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> CliResult<StitchSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| -> CliError {
                    format!("Failed to read config {}: {}", path.display(), e).into()
                })?;
                serde_json::from_str(&raw)?
            }
            None => StitchSettings::default(),
        };
        if let Some(iterations) = self.iterations {
            settings.ransac.iterations = iterations;
        }
        if let Some(distance) = self.inlier_distance {
            settings.ransac.inlier_distance = distance;
        }
        if self.seed.is_some() {
            settings.ransac.seed = self.seed;
        }
        if let Some(count) = self.count {
            settings.correspondence_count = count;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn image_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> CliResult<()> {
    let settings = cli.settings()?;

    let mut images = Vec::with_capacity(cli.images.len());
    for path in &cli.images {
        tracing::info!("Loading image: {}", path.display());
        let image = load_image(path).map_err(|e| -> CliError {
            format!("Failed to open image {}: {}", path.display(), e).into()
        })?;
        images.push(LabeledImage::new(image_id(path), image));
    }

    let stages = match &cli.points {
        Some(path) => load_correspondences(path)?,
        None => Vec::new(),
    };
    if stages.is_empty() && cli.cache_dir.is_none() && images.len() > 1 {
        return Err("no correspondences: pass --points or a populated --cache-dir".into());
    }
    tracing::info!("Loaded {} correspondence stage(s)", stages.len());

    let stitcher = Stitcher::new(settings);
    let precomputed = PrecomputedCorrespondences::new(stages);
    let panorama = match &cli.cache_dir {
        Some(dir) => {
            let mut source = CachedSource::new(PointCache::new(dir), precomputed);
            stitcher.stitch_many(&images, &mut source)?
        }
        None => {
            let mut source = precomputed;
            stitcher.stitch_many(&images, &mut source)?
        }
    };

    save_image(&cli.out, &panorama)?;
    let (w, h) = panorama.dimensions();
    tracing::info!("Panorama {}x{} written to {}", w, h, cli.out.display());
    Ok(())
}
