//! Trait-space geometry for the speciation simulation.
//!
//! Traits live inside an n-dimensional ball centered on the origin. This
//! crate provides the numeric kernels that keep them there: membership
//! tests, uniform sampling inside the ball, Euclidean distance, and the
//! bounded random walk used as the mutation process.
//!
//! # Modules
//!
//! - [`error`] -- [`SamplingError`] for degenerate sampling configurations.
//! - [`n_sphere`] -- Free functions over trait vectors plus the
//!   [`Hypersphere`] bundle of radius and retry limit.

pub mod error;
pub mod n_sphere;

pub use error::SamplingError;
pub use n_sphere::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RADIUS, Hypersphere, apply_bounded_noise, euclidean_distance,
    in_sphere, random_point,
};
