//! Random number generation and index draws over a finite pool.
//!
//! Provides seeded RNG construction plus the two draw primitives the
//! resampling engine is built on: indices with replacement, and indices
//! without replacement (partial Fisher–Yates).
//!
//! # Reproducibility
//!
//! For reproducible runs, use [`create_rng`] with a fixed seed. The
//! underlying algorithm (SmallRng) is deterministic for a given seed on
//! the same platform.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SimError};

/// Creates a fast, seeded random number generator.
///
/// # Examples
/// ```
/// use u_sampling::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Seeded RNG when `seed` is given, OS-entropy RNG otherwise.
pub fn rng_from(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => create_rng(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Draws `n` indices uniformly from `[0, len)` with replacement.
///
/// Returns an empty vector when `len == 0`.
///
/// # Examples
/// ```
/// use u_sampling::random::{create_rng, draw_with_replacement};
/// let mut rng = create_rng(7);
/// let idx = draw_with_replacement(3, 10, &mut rng);
/// assert_eq!(idx.len(), 10);
/// assert!(idx.iter().all(|&i| i < 3));
/// ```
pub fn draw_with_replacement<R: Rng>(len: usize, n: usize, rng: &mut R) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    (0..n).map(|_| rng.random_range(0..len)).collect()
}

/// Draws `n` distinct indices from `[0, len)`.
///
/// # Algorithm
/// Partial Durstenfeld shuffle: only the first `n` positions of the
/// index permutation are materialized.
///
/// Reference: Knuth (1997), *TAOCP* Vol. 2, §3.4.2, Algorithm P.
///
/// # Errors
/// [`SimError::InsufficientPool`] when `n > len`.
///
/// # Examples
/// ```
/// use u_sampling::random::{create_rng, draw_without_replacement};
/// let mut rng = create_rng(1);
/// let mut idx = draw_without_replacement(5, 5, &mut rng).unwrap();
/// idx.sort();
/// assert_eq!(idx, vec![0, 1, 2, 3, 4]);
/// assert!(draw_without_replacement(2, 3, &mut rng).is_err());
/// ```
pub fn draw_without_replacement<R: Rng>(len: usize, n: usize, rng: &mut R) -> Result<Vec<usize>> {
    if n > len {
        return Err(SimError::InsufficientPool {
            requested: n,
            available: len,
        });
    }
    let mut indices: Vec<usize> = (0..len).collect();
    for i in 0..n {
        let j = rng.random_range(i..len);
        indices.swap(i, j);
    }
    indices.truncate(n);
    Ok(indices)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn without_replacement_is_distinct(
            seed in 0_u64..10000,
            len in 0_usize..60,
            frac in 0.0_f64..=1.0,
        ) {
            let n = (len as f64 * frac).floor() as usize;
            let mut rng = create_rng(seed);
            let mut idx = draw_without_replacement(len, n, &mut rng).unwrap();
            prop_assert_eq!(idx.len(), n);
            idx.sort_unstable();
            idx.dedup();
            prop_assert_eq!(idx.len(), n);
            prop_assert!(idx.iter().all(|&i| i < len));
        }

        #[test]
        fn with_replacement_in_range(
            seed in 0_u64..10000,
            len in 1_usize..60,
            n in 0_usize..200,
        ) {
            let mut rng = create_rng(seed);
            let idx = draw_with_replacement(len, n, &mut rng);
            prop_assert_eq!(idx.len(), n);
            prop_assert!(idx.iter().all(|&i| i < len));
        }
    }
}
