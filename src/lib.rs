//! # panostitch - Panorama Stitching with Robust Homographies
//!
//! `panostitch` joins overlapping photographs of a (roughly) planar scene into
//! one panorama. Each image pair is related by a homography fitted with RANSAC
//! on point correspondences; the left image is warped by inverse mapping into
//! the frame of the right one and both are composited on a shared canvas.
//!
//! ## Quick Start
//!
//! ```rust
//! use panostitch::{estimate_homography, CorrespondenceSet, RansacSettings};
//!
//! // A pure 2x scale.
//! let pairs = CorrespondenceSet::from_pairs(
//!     &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
//!     &[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)],
//! )
//! .unwrap();
//!
//! let settings = RansacSettings { seed: Some(1), ..RansacSettings::default() };
//! let result = estimate_homography(&pairs, &settings).unwrap();
//! println!("Found {} inliers", result.inliers.len());
//!
//! let mid = result.homography.apply(&panostitch::Point2D::new(5.0, 5.0)).unwrap();
//! assert!((mid.x - 10.0).abs() < 1e-6 && (mid.y - 10.0).abs() < 1e-6);
//! ```
//!
//! Whole panoramas go through [`Stitcher`], which asks a
//! [`CorrespondenceSource`](correspondence::CorrespondenceSource) for matched
//! points at every stage:
//!
//! ```rust,no_run
//! use panostitch::correspondence::PrecomputedCorrespondences;
//! use panostitch::io::{load_correspondences, load_image, save_image};
//! use panostitch::{LabeledImage, Stitcher};
//!
//! # fn main() -> panostitch::Result<()> {
//! let images = vec![
//!     LabeledImage::new("left", load_image("left.jpg")?),
//!     LabeledImage::new("right", load_image("right.jpg")?),
//! ];
//! let mut source = PrecomputedCorrespondences::new(load_correspondences("points.json")?);
//! let panorama = Stitcher::default().stitch_many(&images, &mut source)?;
//! save_image("panorama.png", &panorama)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Extending the Robust Fit
//!
//! [`RobustFitter`](core::RobustFitter) is generic over three traits:
//!
//! - **[`Estimator`](core::Estimator)**: fits a model from a sample of rows
//! - **[`Sampler`](core::Sampler)**: draws sample indices
//! - **[`Scoring<M>`](core::Scoring)**: counts inliers of a model
//!
//! ### Example: Custom Estimator
//!
//! ```rust
//! use panostitch::core::Estimator;
//! use panostitch::types::DataMatrix;
//! use panostitch::Result;
//!
//! // Translation-only model between the two point columns.
//! #[derive(Clone)]
//! struct Shift {
//!     du: f64,
//!     dv: f64,
//! }
//!
//! struct ShiftEstimator;
//!
//! impl Estimator for ShiftEstimator {
//!     type Model = Shift;
//!
//!     fn sample_size(&self) -> usize {
//!         1
//!     }
//!
//!     fn is_valid_sample(&self, _data: &DataMatrix, sample: &[usize]) -> bool {
//!         !sample.is_empty()
//!     }
//!
//!     fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Result<Shift> {
//!         let n = sample.len() as f64;
//!         let du = sample.iter().map(|&r| data[(r, 2)] - data[(r, 0)]).sum::<f64>() / n;
//!         let dv = sample.iter().map(|&r| data[(r, 3)] - data[(r, 1)]).sum::<f64>() / n;
//!         Ok(Shift { du, dv })
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - **[`api`](api)**: High-level robust homography estimation
//! - **[`core`](core)**: Robust-fit traits and the RANSAC loop
//! - **[`estimators`](estimators)**: Homography estimator
//! - **[`samplers`](samplers)**: Sampling strategies
//! - **[`scoring`](scoring)**: Inlier scoring
//! - **[`transform`](transform)**: Projective point mapping
//! - **[`warp`](warp)**: Grids, interpolants and the inverse-mapping warp
//! - **[`compose`](compose)**: Canvas compositing
//! - **[`pipeline`](pipeline)**: Pairwise and sequential stitching
//! - **[`correspondence`](correspondence)**: Correspondence sources and the point cache
//! - **[`io`](io)**: Image and correspondence files
//! - **[`settings`](settings)**: Configuration types

pub mod api;
pub mod compose;
pub mod core;
pub mod correspondence;
pub mod error;
pub mod estimators;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod transform;
pub mod types;
pub mod utils;
pub mod warp;

// Re-export high-level API
pub use api::{estimate_homography, fit_inliers, InlierSet, RobustHomography};
pub use pipeline::{PairStitch, Stitcher};

// Re-export core traits for easy access
pub use crate::core::{Estimator, Sampler, Scoring};

pub use error::{Result, StitchError};
pub use models::Homography;
pub use settings::{RansacSettings, StitchSettings, WarpSettings};
pub use types::{CanvasOffset, CorrespondenceSet, Image, LabeledImage, Point2D};
