//! Error types for the analysis engine

use thiserror::Error;

/// Analysis engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Neither analysis strategy could be constructed
    #[error("Analysis service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Reasoning service call failed
    #[error("LLM error: {0}")]
    LLMError(#[from] advisor_llm::LLMError),

    /// Market data access failed
    #[error("Market data error: {0}")]
    MarketError(#[from] advisor_market::MarketError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Run-level failure outside stage containment
    #[error("Analysis failed for {symbol}: {reason}")]
    AnalysisFailed { symbol: String, reason: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl From<EngineError> for advisor_core::Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ServiceUnavailable(msg) => advisor_core::Error::ServiceUnavailable(msg),
            other => advisor_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

impl From<advisor_core::Error> for EngineError {
    fn from(err: advisor_core::Error) -> Self {
        match err {
            advisor_core::Error::ServiceUnavailable(msg) => EngineError::ServiceUnavailable(msg),
            other => EngineError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::AnalysisFailed {
            symbol: "AAPL".to_string(),
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Analysis failed for AAPL: boom");
    }

    #[test]
    fn test_service_unavailable_roundtrip() {
        let err = EngineError::ServiceUnavailable("no strategy".to_string());
        let core: advisor_core::Error = err.into();
        assert!(core.is_service_unavailable());

        let back: EngineError = core.into();
        assert!(matches!(back, EngineError::ServiceUnavailable(_)));
    }
}
