//! Error taxonomy shared by every calling convention.

use crate::status::StatusCategory;

/// Boxed source error for transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by a transport invoker.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),
    #[error("request failed: {0}")]
    Request(#[source] BoxError),
    #[error("transport could not be initialized: {0}")]
    Init(#[source] BoxError),
    #[error("request cancelled by client shutdown")]
    Cancelled,
}

/// Classified failure of a single call.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    /// Missing or invalid local configuration or parameters, detected before I/O.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
    /// Non-2xx response, regardless of its body.
    #[error("HTTP error: status {code}")]
    HttpError { code: u16 },
    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },
    #[error("response envelope has no payload")]
    MissingPayload,
    #[error("call cancelled")]
    Cancelled,
}

impl PubSubError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl ToString) -> Self {
        Self::MalformedResponse {
            reason: reason.to_string(),
        }
    }

    /// Status category this failure is reported under.
    #[must_use]
    pub fn category(&self) -> StatusCategory {
        match self {
            Self::InvalidArgument { .. } => StatusCategory::ValidationError,
            Self::Transport(_) => StatusCategory::TransportError,
            Self::HttpError { .. } => StatusCategory::ServerError,
            Self::MalformedResponse { .. } | Self::MissingPayload => StatusCategory::ParsingError,
            Self::Cancelled => StatusCategory::Cancelled,
        }
    }
}

impl From<TransportError> for PubSubError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => Self::Cancelled,
            other => Self::Transport(other),
        }
    }
}
