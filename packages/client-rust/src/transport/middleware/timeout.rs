//! Timeout middleware for transport requests.
//!
//! Fails requests that exceed their descriptor's `timeout` with
//! `TransportError::Timeout`.

use std::task::{Context, Poll};

use tower::{Layer, Service};

use super::TransportFuture;
use crate::error::TransportError;
use crate::request::TransportRequest;
use crate::transport::RawResponse;

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with per-request timeout enforcement.
///
/// The timeout is read from each request's `timeout` field, so a configuration
/// update applies to the next call without rebuilding the stack.
#[derive(Debug, Clone)]
pub struct TimeoutLayer;

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService { inner }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces per-request timeouts.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
}

impl<S> Service<TransportRequest> for TimeoutService<S>
where
    S: Service<TransportRequest, Response = RawResponse, Error = TransportError> + Send,
    S::Future: Send + 'static,
{
    type Response = RawResponse;
    type Error = TransportError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: TransportRequest) -> Self::Future {
        let duration = request.timeout;
        let fut = self.inner.call(request);
        Box::pin(async move {
            match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_elapsed) => Err(TransportError::Timeout {
                    timeout_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                }),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
