//! Geometric level generator.

use rand::prelude::*;
use thiserror::Error;

use crate::level_generator::LevelGenerator;

/// Errors that can occur when creating a [`Geometric`] level generator.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeometricError {
    /// The total number of layers must be non-zero.
    #[error("total must be non-zero.")]
    ZeroTotal,
    /// The probability `$p$` must be in the range `$(0, 1)$`.
    #[error("p must be in (0, 1).")]
    InvalidProbability,
}

/// A level generator using a geometric distribution.
///
/// This distribution assumes that if a node is present at some layer `$n$`,
/// then the probability that it is also present at layer `$n + 1$` is some
/// constant `$p \in (0, 1)$`. This produces `$P(\text{level} \geq n) = p^n$`,
/// truncated at the maximum number of layers allowed.
///
/// The generator owns its random source. By default the source is seeded from
/// the thread-local RNG; [`with_seed`][Geometric::with_seed] produces a fully
/// deterministic generator for reproducible tests. Note that a poorly seeded
/// or constant source does not make the list incorrect, only slow: uniformly
/// low levels degrade the skip list towards a plain linked list.
#[derive(Debug)]
pub struct Geometric {
    /// The total number of layers that are assumed to exist.
    total: usize,
    /// The probability that a node is present in the next layer.
    p: f64,
    /// The random number generator.
    rng: SmallRng,
}

impl Geometric {
    /// Create a new geometric level generator with `total` number of layers,
    /// and `p` as the probability that a given node is present in the next
    /// layer.
    ///
    /// # Errors
    ///
    /// Fails if `total` is zero or `p` is outside of `$(0, 1)$`.
    #[inline]
    pub fn new(total: usize, p: f64) -> Result<Self, GeometricError> {
        Self::validate(total, p)?;
        Ok(Geometric {
            total,
            p,
            rng: SmallRng::from_rng(&mut rand::rng()),
        })
    }

    /// Create a new geometric level generator whose random source is seeded
    /// with `seed`, so that the sequence of levels it produces is fully
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Fails if `total` is zero or `p` is outside of `$(0, 1)$`.
    #[inline]
    pub fn with_seed(total: usize, p: f64, seed: u64) -> Result<Self, GeometricError> {
        Self::validate(total, p)?;
        Ok(Geometric {
            total,
            p,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    fn validate(total: usize, p: f64) -> Result<(), GeometricError> {
        if total == 0 {
            return Err(GeometricError::ZeroTotal);
        }
        if !(0.0 < p && p < 1.0) {
            return Err(GeometricError::InvalidProbability);
        }
        Ok(())
    }
}

impl Default for Geometric {
    /// The default generator uses 16 layers and `$p = 1/2$`, matching
    /// [`SkipMap::new`][crate::SkipMap::new].
    #[inline]
    fn default() -> Self {
        Geometric {
            total: 16,
            p: 0.5,
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }
}

impl LevelGenerator for Geometric {
    #[inline]
    fn total(&self) -> usize {
        self.total
    }

    /// Repeatedly draw a uniform variate in `$[0, 1)$`; while the draw is
    /// below `$p$` and the running level is below `total - 1`, increment the
    /// level. This yields `$P(\text{level} \geq n) = p^n$` for
    /// `$n < \text{total}$`.
    #[inline]
    fn level(&mut self) -> usize {
        let mut h = 0;
        while h + 1 < self.total && self.rng.random::<f64>() < self.p {
            h += 1;
        }
        h
    }
}
