//! Configuration for the analysis engine

use crate::error::{EngineError, Result};
use std::path::PathBuf;

const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_MAX_ITERATIONS: usize = 6;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_LOGS_DIR: &str = "logs/conversations";

/// Configuration for analysis runs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model to use for reasoning requests
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum agentic loop iterations per run
    pub max_iterations: usize,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Directory for write-once conversation logs
    pub logs_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: DEFAULT_MAX_TOKENS,
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `OPENAI_MODEL`, `OPENAI_TEMPERATURE`, and `ADVISOR_LOGS_DIR`,
    /// keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        if let Ok(raw) = std::env::var("OPENAI_TEMPERATURE") {
            if let Ok(temperature) = raw.parse() {
                config.temperature = temperature;
            }
        }
        if let Ok(dir) = std::env::var("ADVISOR_LOGS_DIR") {
            if !dir.is_empty() {
                config.logs_dir = PathBuf::from(dir);
            }
        }

        config
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum agentic loop iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the conversation log directory
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(EngineError::ConfigError("model must not be empty".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::ConfigError(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(EngineError::ConfigError(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.model, "gpt-4-turbo-preview");
        assert_eq!(config.max_iterations, 6);
        assert!((config.temperature - 0.0).abs() < f32::EPSILON);
        assert_eq!(config.logs_dir, PathBuf::from("logs/conversations"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::default()
            .with_model("gpt-4o")
            .with_temperature(0.3)
            .with_max_iterations(4)
            .with_logs_dir("/tmp/advisor-logs");

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_iterations, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_iterations() {
        let config = EngineConfig::default().with_max_iterations(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range_temperature() {
        let config = EngineConfig::default().with_temperature(3.5);
        assert!(config.validate().is_err());
    }
}
