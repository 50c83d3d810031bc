//! Status descriptors delivered alongside every outcome.

use std::fmt;

use pubsub_core::{ClientConfig, OperationKind, ResponseMeta};

use crate::error::PubSubError;

/// Broad classification of a delivered outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Success,
    ValidationError,
    TransportError,
    ParsingError,
    /// The service answered with a non-2xx status.
    ServerError,
    Cancelled,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::ValidationError => "validation_error",
            Self::TransportError => "transport_error",
            Self::ParsingError => "parsing_error",
            Self::ServerError => "server_error",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Metadata accompanying a delivered outcome, success or failure.
#[derive(Debug)]
pub struct Status {
    pub category: StatusCategory,
    pub operation: OperationKind,
    /// HTTP status code, when a response was received.
    pub status_code: Option<u16>,
    /// Server-reported `status`/`message`/`service`, when the envelope decoded.
    pub meta: Option<ResponseMeta>,
    /// Client UUID the call was made with.
    pub uuid: String,
    pub auth_key: Option<String>,
    /// Underlying cause for failure statuses.
    pub error: Option<PubSubError>,
}

impl Status {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.category != StatusCategory::Success
    }
}

/// Per-call facts captured from the configuration snapshot, used to build
/// the final `Status`.
#[derive(Debug, Clone)]
pub(crate) struct StatusContext {
    operation: OperationKind,
    uuid: String,
    auth_key: Option<String>,
}

impl StatusContext {
    pub(crate) fn new(operation: OperationKind, config: &ClientConfig) -> Self {
        Self {
            operation,
            uuid: config.uuid.clone(),
            auth_key: config.auth_key().map(str::to_string),
        }
    }

    /// Context for outcomes produced without a configuration snapshot.
    pub(crate) fn detached(operation: OperationKind) -> Self {
        Self {
            operation,
            uuid: String::new(),
            auth_key: None,
        }
    }

    pub(crate) fn success(&self, status_code: u16, meta: ResponseMeta) -> Status {
        Status {
            category: StatusCategory::Success,
            operation: self.operation,
            status_code: Some(status_code),
            meta: Some(meta),
            uuid: self.uuid.clone(),
            auth_key: self.auth_key.clone(),
            error: None,
        }
    }

    pub(crate) fn failure(&self, error: PubSubError, status_code: Option<u16>) -> Status {
        let status_code = match error {
            PubSubError::HttpError { code } => Some(code),
            _ => status_code,
        };
        Status {
            category: error.category(),
            operation: self.operation,
            status_code,
            meta: None,
            uuid: self.uuid.clone(),
            auth_key: self.auth_key.clone(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> StatusContext {
        let mut config = ClientConfig::with_subscribe_key("sub");
        config.uuid = "myUUID".to_string();
        config.auth_key = Some("myKey".to_string());
        StatusContext::new(OperationKind::WhereNow, &config)
    }

    #[test]
    fn success_status_carries_meta() {
        let meta = ResponseMeta {
            status: Some(200),
            message: Some("OK".to_string()),
            service: Some("Presence".to_string()),
        };
        let status = context().success(200, meta.clone());
        assert!(!status.is_error());
        assert_eq!(status.category, StatusCategory::Success);
        assert_eq!(status.operation, OperationKind::WhereNow);
        assert_eq!(status.status_code, Some(200));
        assert_eq!(status.meta, Some(meta));
        assert_eq!(status.uuid, "myUUID");
        assert_eq!(status.auth_key.as_deref(), Some("myKey"));
        assert!(status.error.is_none());
    }

    #[test]
    fn http_error_status_reports_its_code() {
        let status = context().failure(PubSubError::HttpError { code: 404 }, None);
        assert!(status.is_error());
        assert_eq!(status.category, StatusCategory::ServerError);
        assert_eq!(status.status_code, Some(404));
    }

    #[test]
    fn parsing_failure_keeps_response_code() {
        let status = context().failure(PubSubError::MissingPayload, Some(200));
        assert_eq!(status.category, StatusCategory::ParsingError);
        assert_eq!(status.status_code, Some(200));
        assert!(matches!(status.error, Some(PubSubError::MissingPayload)));
    }
}
