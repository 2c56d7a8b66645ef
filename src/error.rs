use thiserror::Error;

/// Boxed cause carried by transport-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by Weights API operations.
#[derive(Error, Debug)]
pub enum WeightsError {
    /// The request never produced an HTTP response.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        source: BoxError,
    },

    /// The service answered with a non-success HTTP status.
    #[error("Weights API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The health check failed, so the real call was never attempted.
    #[error("Weights API is not reachable: {source}")]
    ServiceUnavailable { source: Box<WeightsError> },

    /// The polled job reached the FAILED state.
    #[error("Image generation {job_id} failed: {message}")]
    GenerationFailed { job_id: String, message: String },

    /// The response body was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// The client configuration cannot be turned into a transport.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polling was abandoned through the cancellation token.
    #[error("Polling was cancelled")]
    Cancelled,
}

impl WeightsError {
    /// Build a [`WeightsError::Transport`] from any error type.
    pub fn transport(
        context: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        WeightsError::Transport {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether this error came from the health gate.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, WeightsError::ServiceUnavailable { .. })
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WeightsError>;
