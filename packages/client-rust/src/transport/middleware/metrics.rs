//! Metrics middleware for transport requests.
//!
//! Records request duration and outcome using `tracing` spans.

use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use super::TransportFuture;
use crate::error::TransportError;
use crate::request::TransportRequest;
use crate::transport::RawResponse;

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments requests with timing and outcome via `tracing` spans.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records request duration and outcome in tracing spans.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<TransportRequest> for MetricsService<S>
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
        let operation = request.operation.as_str();

        let span = info_span!(
            "transport",
            operation = operation,
            method = %request.method,
            path = request.path(),
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = start.elapsed().as_millis() as u64;

                let outcome = match &result {
                    Ok(resp) if resp.is_success() => "ok",
                    Ok(_) => "http_error",
                    Err(_) => "error",
                };

                let span = tracing::Span::current();
                if let Ok(resp) = &result {
                    span.record("status", resp.status);
                }
                span.record("duration_ms", duration_ms);
                span.record("outcome", outcome);

                tracing::debug!(
                    operation = operation,
                    duration_ms = duration_ms,
                    outcome = outcome,
                    "transport exchange complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
