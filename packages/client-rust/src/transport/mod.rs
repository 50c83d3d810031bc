//! Transport invoker contract and the HTTP implementation.
//!
//! The dispatcher only depends on [`TransportInvoker`]. [`HttpTransport`]
//! implements it with a tower stack over `reqwest`:
//!
//! 1. [`middleware::TimeoutLayer`]: per-request timeout from the descriptor
//! 2. [`middleware::MetricsLayer`]: timing and outcome via `tracing` spans
//! 3. [`service::HttpService`]: the actual network exchange

pub mod service;
pub mod middleware;

use bytes::Bytes;

pub use service::{build_transport_stack, HttpService, HttpTransport};
use crate::error::TransportError;
use crate::request::TransportRequest;

/// Status code and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Completion handler for an asynchronous exchange.
pub type Completion = Box<dyn FnOnce(Result<RawResponse, TransportError>) + Send + 'static>;

/// Executes transport requests on behalf of the dispatcher.
pub trait TransportInvoker: Send + Sync {
    /// Runs the exchange on the calling thread, blocking until a response,
    /// a network failure, or the request timeout.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response could be obtained.
    fn execute_sync(&self, request: TransportRequest) -> Result<RawResponse, TransportError>;

    /// Schedules the exchange on a worker and returns immediately.
    ///
    /// `on_complete` runs exactly once, off the caller's thread, with the response
    /// or the failure. Shutdown delivers `TransportError::Cancelled`.
    fn execute_async(&self, request: TransportRequest, on_complete: Completion);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx_only() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(RawResponse::new(299, "").is_success());
        assert!(!RawResponse::new(199, "").is_success());
        assert!(!RawResponse::new(300, "").is_success());
        assert!(!RawResponse::new(400, "").is_success());
        assert!(!RawResponse::new(404, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }
}
