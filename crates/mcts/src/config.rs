//! Search configuration parameters.
//!
//! These parameters control the behavior of the tagline search. They are
//! validated once, before the first iteration runs.

use tagline_core::{Result, TaglineError};

/// Search configuration parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MctsConfig {
    /// Number of select/expand/simulate/backpropagate iterations per run.
    pub iterations: usize,

    /// Maximum number of words in a tagline. Nodes at this depth are never
    /// expanded.
    pub max_depth: usize,

    /// Maximum number of children created when a node is expanded.
    pub branching_factor: usize,

    /// UCB1 exploration constant.
    /// Kept small because each rating is noisy and expensive.
    pub exploration: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            max_depth: 10,
            branching_factor: 5,
            exploration: 0.1,
        }
    }
}

impl MctsConfig {
    /// Create a new config with the specified number of iterations.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    /// Check that the configuration can drive a search.
    ///
    /// # Errors
    /// Returns `TaglineError::InvalidConfig` if the iteration count, depth
    /// ceiling or branching factor is zero, or the exploration constant is
    /// negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(invalid("iterations", "must be positive"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", "must be positive"));
        }
        if self.branching_factor == 0 {
            return Err(invalid("branching_factor", "must be positive"));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(invalid(
                "exploration",
                format!("must be a finite non-negative number, got {}", self.exploration),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TaglineError {
    TaglineError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagline_core::ErrorCategory;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.branching_factor, 5);
        assert!((config.exploration - 0.1).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_iterations() {
        let config = MctsConfig::with_iterations(100);
        assert_eq!(config.iterations, 100);
        // Other values should be default
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = MctsConfig::with_iterations(0);
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);

        config.iterations = 5;
        config.max_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(TaglineError::InvalidConfig { field: "max_depth", .. })
        ));

        config.max_depth = 3;
        config.branching_factor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_exploration() {
        let mut config = MctsConfig::default();
        config.exploration = -0.5;
        assert!(config.validate().is_err());
        config.exploration = f64::NAN;
        assert!(config.validate().is_err());
        config.exploration = 0.0;
        assert!(config.validate().is_ok());
    }
}
