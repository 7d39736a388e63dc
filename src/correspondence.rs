//! Where correspondences come from.
//!
//! The stitcher never detects features itself. Each pairwise stage asks a
//! [`CorrespondenceSource`] for matched points; sources can be precomputed
//! lists, closures wrapping a feature matcher, or a [`CachedSource`] that
//! persists picked points per image so they are only produced once.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StitchError};
use crate::types::{CorrespondenceSet, Image, Point2D};

/// One pairwise stitching stage asking for correspondences.
#[derive(Debug, Clone, Copy)]
pub struct PairRequest<'a> {
    /// Zero-based stage index; stage `k` joins the running composite with
    /// image `k + 1`.
    pub stage: usize,
    pub left_id: &'a str,
    pub right_id: &'a str,
    /// Image that will be warped.
    pub left: &'a Image,
    /// Reference image.
    pub right: &'a Image,
    /// Number of correspondences requested.
    pub count: usize,
}

/// Produces matched points between the two images of a stage.
pub trait CorrespondenceSource {
    /// Points in `request.left` (source) and `request.right` (target), in
    /// matching order.
    fn correspondences(&mut self, request: &PairRequest<'_>) -> Result<CorrespondenceSet>;
}

impl<S: CorrespondenceSource + ?Sized> CorrespondenceSource for &mut S {
    fn correspondences(&mut self, request: &PairRequest<'_>) -> Result<CorrespondenceSet> {
        (**self).correspondences(request)
    }
}

/// One fixed correspondence set per stage.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedCorrespondences {
    stages: Vec<CorrespondenceSet>,
}

impl PrecomputedCorrespondences {
    pub fn new(stages: Vec<CorrespondenceSet>) -> Self {
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl CorrespondenceSource for PrecomputedCorrespondences {
    fn correspondences(&mut self, request: &PairRequest<'_>) -> Result<CorrespondenceSet> {
        self.stages
            .get(request.stage)
            .cloned()
            .ok_or(StitchError::MissingCorrespondences {
                stage: request.stage,
            })
    }
}

/// Source backed by a closure, typically wrapping a feature matcher.
pub struct FnSource<F> {
    f: F,
}

/// Wrap `f` as a [`CorrespondenceSource`].
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut(&PairRequest<'_>) -> Result<CorrespondenceSet>,
{
    FnSource { f }
}

impl<F> CorrespondenceSource for FnSource<F>
where
    F: FnMut(&PairRequest<'_>) -> Result<CorrespondenceSet>,
{
    fn correspondences(&mut self, request: &PairRequest<'_>) -> Result<CorrespondenceSet> {
        (self.f)(request)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedPoints {
    points: Vec<[f64; 2]>,
}

/// Directory of `<id>.json` files, each holding the points picked in one
/// image as `{"points": [[u, v], ...]}`.
#[derive(Debug, Clone)]
pub struct PointCache {
    dir: PathBuf,
}

impl PointCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the points of image `id`. Path separators in `id` are
    /// replaced so every entry stays inside the cache directory.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let name: String = id
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    /// Points stored for `id`, or `None` if the cache has no entry.
    pub fn load(&self, id: &str) -> Result<Option<Vec<Point2D>>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let cached: CachedPoints = serde_json::from_str(&raw)?;
        Ok(Some(
            cached
                .points
                .into_iter()
                .map(|[u, v]| Point2D::new(u, v))
                .collect(),
        ))
    }

    pub fn store(&self, id: &str, points: &[Point2D]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let cached = CachedPoints {
            points: points.iter().map(|p| [p.x, p.y]).collect(),
        };
        fs::write(self.path_for(id), serde_json::to_string_pretty(&cached)?)?;
        Ok(())
    }
}

/// Serves stages from a [`PointCache`] and falls back to `inner` on a miss.
///
/// A stage hits the cache only when both images have entries of equal
/// length; whatever `inner` returns on a miss is written back for both.
#[derive(Debug, Clone)]
pub struct CachedSource<S> {
    cache: PointCache,
    inner: S,
}

impl<S> CachedSource<S> {
    pub fn new(cache: PointCache, inner: S) -> Self {
        Self { cache, inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: CorrespondenceSource> CorrespondenceSource for CachedSource<S> {
    fn correspondences(&mut self, request: &PairRequest<'_>) -> Result<CorrespondenceSet> {
        let left = self.cache.load(request.left_id)?;
        let right = self.cache.load(request.right_id)?;
        if let (Some(src), Some(dst)) = (left, right) {
            if src.len() == dst.len() {
                debug!(
                    stage = request.stage,
                    left = request.left_id,
                    right = request.right_id,
                    "correspondence cache hit"
                );
                return CorrespondenceSet::new(src, dst);
            }
        }

        let set = self.inner.correspondences(request)?;
        self.cache.store(request.left_id, set.src())?;
        self.cache.store(request.right_id, set.dst())?;
        debug!(
            stage = request.stage,
            count = set.len(),
            "stored correspondences in cache"
        );
        Ok(set)
    }
}
