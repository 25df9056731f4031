//! Sampling inside an n-dimensional ball.
//!
//! Every kernel here is a rejection sampler: draw a candidate, keep it if it
//! lies strictly inside the ball, otherwise draw again. Acceptance
//! probability is the ratio of the ball's volume to its bounding box, which
//! collapses quickly with dimension (about 0.52 in 3-D, 0.0025 in 10-D). The
//! loops are therefore bounded by a retry limit and report
//! [`SamplingError::DidNotConverge`] instead of spinning.
//!
//! # Trait domain
//!
//! The default radius is `0.5`, so a trait vector always fits inside the
//! unit hypercube centered on the origin.

use rand::Rng;
use rand::distr::Distribution;
use tracing::warn;

use crate::error::SamplingError;

/// Default sphere radius: the trait domain spans one unit across.
pub const DEFAULT_RADIUS: f64 = 0.5;

/// Default retry limit for the rejection loops.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Return `true` if `vector` lies strictly inside the ball of `radius`
/// centered on the origin.
///
/// Compares the squared norm against `radius²`, so no square root is taken.
pub fn in_sphere(vector: &[f64], radius: f64) -> bool {
    let squared: f64 = vector.iter().map(|x| x * x).sum();
    squared < radius * radius
}

/// Euclidean distance between two vectors.
///
/// Only the common prefix participates: if the lengths differ the extra
/// components of the longer vector are ignored.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Draw a point uniformly distributed inside the ball of `radius`.
///
/// Each coordinate is drawn from `[-radius, radius]`; the whole vector is
/// redrawn until it lands inside the ball.
///
/// # Errors
///
/// Returns [`SamplingError::InvalidRadius`] or [`SamplingError::ZeroAttempts`]
/// for a degenerate configuration, and [`SamplingError::DidNotConverge`] if
/// `max_attempts` candidates were all rejected.
pub fn random_point<R: Rng + ?Sized>(
    rng: &mut R,
    dimension: usize,
    radius: f64,
    max_attempts: u32,
) -> Result<Vec<f64>, SamplingError> {
    check_limits(radius, max_attempts)?;

    let mut candidate = vec![0.0; dimension];
    for _ in 0..max_attempts {
        for coordinate in &mut candidate {
            *coordinate = rng.random_range(-radius..=radius);
        }
        if in_sphere(&candidate, radius) {
            return Ok(candidate);
        }
    }

    warn!(dimension, radius, max_attempts, "random point sampling did not converge");
    Err(SamplingError::DidNotConverge {
        attempts: max_attempts,
    })
}

/// Perturb `vector` in place with independent draws from `noise`, keeping
/// the result inside the ball of `radius`.
///
/// Candidates are built from the original vector each time, so a rejected
/// draw never accumulates. The vector is only written once a candidate is
/// accepted; on error it is left untouched.
///
/// # Errors
///
/// Same conditions as [`random_point`]. A vector that already lies outside
/// the ball can still converge if the noise pulls it back in.
pub fn apply_bounded_noise<R, D>(
    vector: &mut [f64],
    rng: &mut R,
    noise: &D,
    radius: f64,
    max_attempts: u32,
) -> Result<(), SamplingError>
where
    R: Rng + ?Sized,
    D: Distribution<f64> + ?Sized,
{
    check_limits(radius, max_attempts)?;

    let mut candidate = vector.to_vec();
    for _ in 0..max_attempts {
        for (slot, original) in candidate.iter_mut().zip(vector.iter()) {
            *slot = original + noise.sample(rng);
        }
        if in_sphere(&candidate, radius) {
            vector.copy_from_slice(&candidate);
            return Ok(());
        }
    }

    warn!(
        dimension = vector.len(),
        radius,
        max_attempts,
        "bounded noise did not converge"
    );
    Err(SamplingError::DidNotConverge {
        attempts: max_attempts,
    })
}

fn check_limits(radius: f64, max_attempts: u32) -> Result<(), SamplingError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(SamplingError::InvalidRadius(radius));
    }
    if max_attempts == 0 {
        return Err(SamplingError::ZeroAttempts);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Hypersphere
// ---------------------------------------------------------------------------

/// A validated ball radius paired with a retry limit.
///
/// Built once from configuration and handed to every mutation so that the
/// trait domain is fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hypersphere {
    radius: f64,
    max_attempts: u32,
}

impl Hypersphere {
    /// Create a sphere of the given radius and retry limit.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidRadius`] if `radius` is not finite and
    /// positive, or [`SamplingError::ZeroAttempts`] if `max_attempts` is zero.
    pub fn new(radius: f64, max_attempts: u32) -> Result<Self, SamplingError> {
        check_limits(radius, max_attempts)?;
        Ok(Self {
            radius,
            max_attempts,
        })
    }

    /// The ball radius.
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// The retry limit applied to each rejection loop.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether `vector` lies strictly inside this sphere.
    pub fn contains(&self, vector: &[f64]) -> bool {
        in_sphere(vector, self.radius)
    }

    /// Draw a uniform point of the given dimension inside this sphere.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::DidNotConverge`] if the retry limit is hit.
    pub fn random_point<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        dimension: usize,
    ) -> Result<Vec<f64>, SamplingError> {
        random_point(rng, dimension, self.radius, self.max_attempts)
    }

    /// Apply bounded noise to `vector`, keeping it inside this sphere.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::DidNotConverge`] if the retry limit is hit.
    pub fn perturb<R, D>(&self, vector: &mut [f64], rng: &mut R, noise: &D) -> Result<(), SamplingError>
    where
        R: Rng + ?Sized,
        D: Distribution<f64> + ?Sized,
    {
        apply_bounded_noise(vector, rng, noise, self.radius, self.max_attempts)
    }
}

impl Default for Hypersphere {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
