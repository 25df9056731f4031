//! Error types for the `speciation-geometry` crate.

/// Errors raised by the rejection-sampling kernels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    /// The rejection loop hit its retry limit without producing a point
    /// inside the sphere. Usually the dimension is too high for the radius,
    /// or the noise scale is too large relative to it.
    #[error("sampling failed to converge after {attempts} attempts")]
    DidNotConverge {
        /// Number of candidates drawn before giving up.
        attempts: u32,
    },

    /// The sphere radius must be finite and strictly positive.
    #[error("invalid sphere radius: {0}")]
    InvalidRadius(f64),

    /// A retry limit of zero can never accept a candidate.
    #[error("retry limit must be at least one")]
    ZeroAttempts,
}
