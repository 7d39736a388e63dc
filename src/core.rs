//! Core robust-fitting traits and the RANSAC loop.
//!
//! The loop is split along the same seams as a classic RANSAC pipeline:
//! - an [`Estimator`] turns a set of correspondence rows into a model,
//! - a [`Sampler`] draws minimal samples,
//! - a [`Scoring`] strategy counts the support of a model.
//!
//! [`RobustFitter`] orchestrates them. It always runs the full iteration
//! budget; refinement on the current inlier set is opportunistic and
//! triggered by [`RefinementThreshold`], never a stopping criterion.

use tracing::{debug, warn};

use crate::error::{Result, StitchError};
use crate::scoring::Score;
use crate::settings::RansacSettings;
use crate::types::DataMatrix;

/// Estimator responsible for generating model hypotheses from data rows.
pub trait Estimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Size of a minimal sample for this estimator.
    fn sample_size(&self) -> usize;

    /// Check whether a given sample is geometrically valid.
    fn is_valid_sample(&self, data: &DataMatrix, sample: &[usize]) -> bool;

    /// Estimate a model from the rows in `sample`.
    ///
    /// Minimal samples are solved exactly, larger ones in the least-squares
    /// sense.
    fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Result<Self::Model>;
}

/// Sampler responsible for drawing minimal samples from the data.
pub trait Sampler {
    /// Draw `sample_size` distinct row indices into `out_indices`.
    ///
    /// Returns `false` if a sample could not be drawn.
    fn sample(&mut self, data: &DataMatrix, sample_size: usize, out_indices: &mut [usize]) -> bool;
}

/// Scoring strategy used to evaluate model quality and determine inliers.
pub trait Scoring<M> {
    /// Inlier/outlier threshold for residuals in the chosen domain.
    fn threshold(&self) -> f64;

    /// Score a model and write its inlier rows into `inliers_out`.
    fn score(&self, data: &DataMatrix, model: &M, inliers_out: &mut Vec<usize>) -> Score;
}

/// Whether a returned inlier set is backed by consensus or is a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Selected by inlier count over the iteration budget.
    Consensus,
    /// No round produced a usable model; the first drawn sample is returned.
    Degraded,
}

/// Result of a [`RobustFitter::run`].
#[derive(Debug, Clone)]
pub struct FitOutcome<M> {
    /// Best model found, `None` for a degraded outcome.
    pub model: Option<M>,
    /// Rows supporting the best model.
    pub inliers: Vec<usize>,
    pub score: Score,
    pub support: Support,
    /// Number of rounds executed.
    pub iterations: usize,
    /// Number of refinement passes triggered.
    pub refinements: usize,
}

/// Best candidate seen so far.
#[derive(Debug, Clone)]
struct Candidate<M> {
    score: Score,
    inliers: Vec<usize>,
    model: M,
}

/// Keep the candidate with more inliers; ties keep the incumbent.
fn keep_better<M>(best: Option<Candidate<M>>, challenger: Candidate<M>) -> Option<Candidate<M>> {
    match best {
        Some(incumbent) if challenger.score <= incumbent.score => Some(incumbent),
        _ => Some(challenger),
    }
}

/// RANSAC pipeline over an estimator, a sampler and a scoring strategy.
pub struct RobustFitter<E, Sa, Sc>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
{
    pub settings: RansacSettings,
    pub estimator: E,
    pub sampler: Sa,
    pub scoring: Sc,
}

impl<E, Sa, Sc> RobustFitter<E, Sa, Sc>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
{
    pub fn new(settings: RansacSettings, estimator: E, sampler: Sa, scoring: Sc) -> Self {
        Self {
            settings,
            estimator,
            sampler,
            scoring,
        }
    }

    /// Run the full iteration budget on `data` and return the best-supported
    /// inlier set.
    pub fn run(&mut self, data: &DataMatrix) -> Result<FitOutcome<E::Model>> {
        self.settings.validate()?;

        let n = data.nrows();
        let sample_size = self.settings.sample_size;
        if sample_size < self.estimator.sample_size() {
            return Err(StitchError::InvalidSettings(format!(
                "sample size {sample_size} is below the minimum of {}",
                self.estimator.sample_size()
            )));
        }
        if sample_size > n {
            return Err(StitchError::OutOfRangeSample {
                requested: sample_size,
                available: n,
            });
        }

        let refine_at = self.settings.refinement_threshold.resolve(n);
        let mut sample = vec![0usize; sample_size];
        let mut first_sample: Option<Vec<usize>> = None;
        let mut best: Option<Candidate<E::Model>> = None;
        let mut refinements = 0usize;
        let mut iteration = 0usize;

        while iteration < self.settings.iterations {
            iteration += 1;

            if !self.sampler.sample(data, sample_size, &mut sample) {
                continue;
            }
            if first_sample.is_none() {
                first_sample = Some(sample.clone());
            }
            if !self.estimator.is_valid_sample(data, &sample) {
                continue;
            }

            let Some(candidate) = self.evaluate(data, &sample) else {
                continue;
            };

            if candidate.score.inlier_count >= refine_at
                && candidate.inliers.len() >= sample_size
            {
                if let Some(refined) = self.evaluate(data, &candidate.inliers) {
                    refinements += 1;
                    best = keep_better(best, candidate);
                    best = keep_better(best, refined);
                    continue;
                }
            }
            best = keep_better(best, candidate);
        }

        match (best, first_sample) {
            (Some(best), _) if best.score.inlier_count > 0 => {
                debug!(
                    inliers = best.score.inlier_count,
                    total = n,
                    iterations = iteration,
                    refinements,
                    "robust fit finished"
                );
                Ok(FitOutcome {
                    model: Some(best.model),
                    inliers: best.inliers,
                    score: best.score,
                    support: Support::Consensus,
                    iterations: iteration,
                    refinements,
                })
            }
            (_, Some(fallback)) => {
                warn!(
                    total = n,
                    iterations = iteration,
                    "no round produced inliers, returning first drawn sample"
                );
                Ok(FitOutcome {
                    model: None,
                    score: Score::new(0),
                    inliers: fallback,
                    support: Support::Degraded,
                    iterations: iteration,
                    refinements,
                })
            }
            (_, None) => Err(StitchError::EmptyInlierSet),
        }
    }

    /// Fit on `rows` and score the model against every row.
    fn evaluate(&self, data: &DataMatrix, rows: &[usize]) -> Option<Candidate<E::Model>> {
        let model = self.estimator.estimate_model(data, rows).ok()?;
        let mut inliers = Vec::new();
        let score = self.scoring.score(data, &model, &mut inliers);
        Some(Candidate {
            score,
            inliers,
            model,
        })
    }
}
