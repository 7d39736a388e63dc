//! Small numeric helpers shared by the estimators and samplers.

use nalgebra::{DMatrix, DVector};
use rand::distributions::Uniform;
use rand::prelude::*;

/// Uniform index generator backed by a seedable `StdRng`.
///
/// Production code seeds from entropy; tests and reproducible runs pass a
/// fixed seed.
pub struct UniformRandomGenerator {
    rng: StdRng,
}

impl Default for UniformRandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformRandomGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fill `out` with distinct indices drawn uniformly from `[0, n)`.
    ///
    /// Rejection sampling is fine for the small sample sizes minimal solvers
    /// use. Panics in debug builds if `out.len() > n`.
    pub fn gen_unique(&mut self, out: &mut [usize], n: usize) {
        debug_assert!(out.len() <= n);
        if out.is_empty() {
            return;
        }
        let dist = Uniform::new(0, n);
        for i in 0..out.len() {
            loop {
                let candidate = self.rng.sample(dist);
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
    }
}

/// Gaussian elimination with partial pivoting solving `A x = b`.
///
/// `augmented` holds `[A | b]` with `A` square. Returns `None` when a pivot
/// falls below `1e-10`, i.e. the system is singular for practical purposes.
pub fn gauss_elimination(mut augmented: DMatrix<f64>) -> Option<DVector<f64>> {
    let n = augmented.nrows();
    if n == 0 || augmented.ncols() != n + 1 {
        return None;
    }

    for i in 0..n {
        let max_row = (i..n)
            .max_by(|&a, &b| {
                augmented[(a, i)]
                    .abs()
                    .total_cmp(&augmented[(b, i)].abs())
            })
            .unwrap_or(i);
        if max_row != i {
            augmented.swap_rows(i, max_row);
        }

        let pivot = augmented[(i, i)];
        if pivot.abs() < 1e-10 {
            return None;
        }

        for k in (i + 1)..n {
            let factor = augmented[(k, i)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in i..=n {
                augmented[(k, j)] -= factor * augmented[(i, j)];
            }
        }
    }

    let mut x = DVector::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut acc = augmented[(i, n)];
        for j in (i + 1)..n {
            acc -= augmented[(i, j)] * x[j];
        }
        x[i] = acc / augmented[(i, i)];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unique_samples_within_bounds() {
        let mut rng = UniformRandomGenerator::from_seed(1234);
        let mut buf = [0usize; 5];
        rng.gen_unique(&mut buf, 11);

        assert!(buf.iter().all(|&v| v < 11));
        for i in 0..buf.len() {
            for j in (i + 1)..buf.len() {
                assert_ne!(buf[i], buf[j]);
            }
        }
    }

    #[test]
    fn full_draw_is_a_permutation() {
        let mut rng = UniformRandomGenerator::from_seed(7);
        let mut buf = [0usize; 6];
        rng.gen_unique(&mut buf, 6);
        let mut sorted = buf.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let mut rng1 = UniformRandomGenerator::from_seed(42);
        let mut rng2 = UniformRandomGenerator::from_seed(42);
        let mut a = [0usize; 4];
        let mut b = [0usize; 4];
        for _ in 0..10 {
            rng1.gen_unique(&mut a, 100);
            rng2.gen_unique(&mut b, 100);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn gauss_elimination_solves_small_system() {
        // 2x + y = 5, x - y = 1  =>  x = 2, y = 1
        let augmented = DMatrix::from_row_slice(2, 3, &[2.0, 1.0, 5.0, 1.0, -1.0, 1.0]);
        let x = gauss_elimination(augmented).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn gauss_elimination_rejects_singular_system() {
        let augmented = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);
        assert!(gauss_elimination(augmented).is_none());
    }
}
