//! Configuration loading and typed config structures for a speciation run.
//!
//! Configuration is YAML. Every field has a default, so an empty document
//! is a valid configuration:
//!
//! ```yaml
//! tree:
//!   start_date: 0
//!   initial_traits: [0.0, 0.0]
//! sampling:
//!   trait_radius: 0.5
//!   mutation_sigma: 0.01
//!   max_attempts: 10000
//! ```

use std::path::Path;

use rand_distr::Normal;
use serde::Deserialize;

use speciation_geometry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RADIUS, Hypersphere, SamplingError};
use speciation_types::Date;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but describe an unusable run.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl From<SamplingError> for ConfigError {
    fn from(err: SamplingError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Top-level configuration of a speciation run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpeciationConfig {
    /// Tree construction settings.
    #[serde(default)]
    pub tree: TreeConfig,

    /// Trait sphere and mutation kernel settings.
    #[serde(default)]
    pub sampling: SamplingConfig,
}

impl SpeciationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a usable run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a non-positive radius, a negative
    /// or non-finite sigma, a zero retry limit, or initial traits outside the
    /// trait sphere.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sphere = self.sampling.hypersphere()?;
        self.sampling.noise()?;
        if !sphere.contains(&self.tree.initial_traits) {
            return Err(ConfigError::Invalid(format!(
                "initial traits {:?} lie outside the trait sphere of radius {}",
                self.tree.initial_traits,
                sphere.radius()
            )));
        }
        Ok(())
    }
}

/// How the tree starts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeConfig {
    /// Creation date of the root species.
    #[serde(default)]
    pub start_date: Date,

    /// Trait vector of the root species. Its length fixes the trait
    /// dimensionality for the whole run.
    #[serde(default = "default_initial_traits")]
    pub initial_traits: Vec<f64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            start_date: 0,
            initial_traits: default_initial_traits(),
        }
    }
}

/// Trait sphere and mutation kernel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplingConfig {
    /// Radius of the trait sphere (default: 0.5).
    #[serde(default = "default_trait_radius")]
    pub trait_radius: f64,

    /// Standard deviation of the per-trait Gaussian step (default: 0.01).
    #[serde(default = "default_mutation_sigma")]
    pub mutation_sigma: f64,

    /// Retry limit for each rejection-sampling loop (default: 10 000).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl SamplingConfig {
    /// Build the trait sphere.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError`] for a degenerate radius or retry limit.
    pub fn hypersphere(&self) -> Result<Hypersphere, SamplingError> {
        Hypersphere::new(self.trait_radius, self.max_attempts)
    }

    /// Build the zero-mean Gaussian mutation kernel.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the sigma is negative or not
    /// finite.
    pub fn noise(&self) -> Result<Normal<f64>, ConfigError> {
        if !self.mutation_sigma.is_finite() || self.mutation_sigma < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "mutation_sigma must be finite and non-negative, got {}",
                self.mutation_sigma
            )));
        }
        Normal::new(0.0, self.mutation_sigma)
            .map_err(|e| ConfigError::Invalid(format!("mutation_sigma {}: {e}", self.mutation_sigma)))
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            trait_radius: default_trait_radius(),
            mutation_sigma: default_mutation_sigma(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_initial_traits() -> Vec<f64> {
    vec![0.0, 0.0]
}

const fn default_trait_radius() -> f64 {
    DEFAULT_RADIUS
}

const fn default_mutation_sigma() -> f64 {
    0.01
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SpeciationConfig::parse("{}");
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config, SpeciationConfig::default());
        assert_eq!(config.tree.initial_traits, vec![0.0, 0.0]);
        assert!((config.sampling.trait_radius - 0.5).abs() < EPSILON);
        assert_eq!(config.sampling.max_attempts, 10_000);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let yaml = "
tree:
  start_date: 100
  initial_traits: [0.1, 0.1, 0.1]
sampling:
  mutation_sigma: 0.2
";
        let config = SpeciationConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.tree.start_date, 100);
        assert_eq!(config.tree.initial_traits.len(), 3);
        assert!((config.sampling.mutation_sigma - 0.2).abs() < EPSILON);
        assert_eq!(config.sampling.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn traits_outside_sphere_rejected() {
        let yaml = "tree:\n  initial_traits: [0.4, 0.4]\n";
        assert!(matches!(SpeciationConfig::parse(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn degenerate_sampling_rejected() {
        for yaml in [
            "sampling:\n  trait_radius: 0.0\n",
            "sampling:\n  mutation_sigma: -1.0\n",
            "sampling:\n  max_attempts: 0\n",
            "sampling:\n  mutation_sigma: -0.001\n",
            "sampling:\n  mutation_sigma: .nan\n",
        ] {
            assert!(
                matches!(SpeciationConfig::parse(yaml), Err(ConfigError::Invalid(_))),
                "accepted: {yaml}"
            );
        }
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            SpeciationConfig::parse("tree: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SpeciationConfig::from_file(Path::new("/nonexistent/speciation.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn negative_sigma_has_no_kernel() {
        let sampling = SamplingConfig {
            mutation_sigma: -1.0,
            ..SamplingConfig::default()
        };
        assert!(matches!(sampling.noise(), Err(ConfigError::Invalid(_))));
        let zero = SamplingConfig {
            mutation_sigma: 0.0,
            ..SamplingConfig::default()
        };
        assert!(zero.noise().is_ok());
    }

    #[test]
    fn builds_sampler_and_kernel() {
        let sampling = SamplingConfig::default();
        assert!(sampling.hypersphere().is_ok_and(|s| s.max_attempts() == DEFAULT_MAX_ATTEMPTS));
        assert!(sampling.noise().is_ok());
    }
}
