use thiserror::Error;

/// Stand-in for an infinite false/true ratio when the best-true probability is zero.
pub const DEFAULT_INFINITE_RATIO: f64 = 1e308;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// How much of the pipeline an evaluation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// Schedule and forward pass only. Yields the maximum and total probability.
    Lightweight,
    /// All stages, including the decided state and the pivot variable.
    #[default]
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub mode: EvaluationMode,
    pub infinite_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::default(),
            infinite_ratio: DEFAULT_INFINITE_RATIO,
        }
    }
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    mode: Option<EvaluationMode>,
    infinite_ratio: Option<f64>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn infinite_ratio(mut self, ratio: f64) -> Self {
        self.infinite_ratio = Some(ratio);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let mode = self.mode.ok_or(ConfigError::MissingParameter("mode"))?;
        let infinite_ratio = self.infinite_ratio.unwrap_or(DEFAULT_INFINITE_RATIO);
        if infinite_ratio.is_nan() || infinite_ratio <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "infinite_ratio",
                reason: format!("expected a positive value, got {infinite_ratio}"),
            });
        }
        Ok(EngineConfig {
            mode,
            infinite_ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_applies_default_ratio() {
        let config = EngineConfigBuilder::new()
            .mode(EvaluationMode::Lightweight)
            .build()
            .unwrap();
        assert_eq!(config.mode, EvaluationMode::Lightweight);
        assert_eq!(config.infinite_ratio, DEFAULT_INFINITE_RATIO);
    }

    #[test]
    fn build_requires_mode() {
        let result = EngineConfigBuilder::new().infinite_ratio(10.0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("mode")));
    }

    #[test]
    fn build_rejects_non_positive_ratio() {
        for ratio in [0.0, -1.0, f64::NAN] {
            let result = EngineConfigBuilder::new()
                .mode(EvaluationMode::Full)
                .infinite_ratio(ratio)
                .build();
            assert!(matches!(
                result,
                Err(ConfigError::InvalidParameter {
                    name: "infinite_ratio",
                    ..
                })
            ));
        }
    }

    #[test]
    fn infinity_is_an_acceptable_sentinel() {
        let config = EngineConfigBuilder::new()
            .mode(EvaluationMode::Full)
            .infinite_ratio(f64::INFINITY)
            .build()
            .unwrap();
        assert!(config.infinite_ratio.is_infinite());
    }

    #[test]
    fn default_runs_full_pipeline() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, EvaluationMode::Full);
        assert_eq!(config.infinite_ratio, 1e308);
    }
}
