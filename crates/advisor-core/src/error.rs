//! Error types for advisor-core

use thiserror::Error;

/// Result type alias for advisor-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for analysis operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// A strategy or shared resource failed to initialize
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// A request failed outside any stage's local containment
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// Neither analysis strategy could be constructed; requests fail fast
    #[error("Analysis service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl Error {
    /// True when the error is the fail-fast service-unavailable signal
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Error::ServiceUnavailable(_))
    }
}
