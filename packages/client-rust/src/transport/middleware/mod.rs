//! Tower middleware layers for the transport stack.
//!
//! - [`timeout`]: Per-request timeout enforcement
//! - [`metrics`]: Request timing and outcome via `tracing` spans

pub mod metrics;
pub mod timeout;

pub use metrics::MetricsLayer;
pub use timeout::TimeoutLayer;

/// Boxed future returned by every service in the transport stack.
pub type TransportFuture = std::pin::Pin<
    Box<
        dyn std::future::Future<
                Output = Result<super::RawResponse, crate::error::TransportError>,
            > + Send,
    >,
>;
