//! HTTP transport over `reqwest`, driven by a dedicated worker runtime.

use std::sync::mpsc;
use std::task::{Context, Poll};

use pubsub_core::ClientConfig;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::watch;
use tower::{Service, ServiceBuilder, ServiceExt};
use tracing::debug;

use super::middleware::{MetricsLayer, TimeoutLayer, TransportFuture};
use super::{Completion, RawResponse, TransportInvoker};
use crate::error::TransportError;
use crate::request::TransportRequest;

const WORKER_THREADS: usize = 2;

// ---------------------------------------------------------------------------
// HttpService
// ---------------------------------------------------------------------------

/// Innermost service: performs one HTTP exchange with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpService {
    client: reqwest::Client,
}

impl HttpService {
    /// Creates the service with connection settings taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Init` if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(pubsub_core::SDK_NAME)
            .build()
            .map_err(|e| TransportError::Init(Box::new(e)))?;
        Ok(Self { client })
    }
}

impl Service<TransportRequest> for HttpService {
    type Response = RawResponse;
    type Error = TransportError;
    type Future = TransportFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: TransportRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);
            let response = client
                .request(request.method, request.url)
                .send()
                .await
                .map_err(|e| classify(e, timeout_ms))?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| classify(e, timeout_ms))?;
            Ok(RawResponse { status, body })
        })
    }
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { timeout_ms }
    } else if err.is_connect() {
        TransportError::Connect(Box::new(err))
    } else {
        TransportError::Request(Box::new(err))
    }
}

/// Wraps the HTTP service with the transport middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- enforce the request's timeout
/// 2. `MetricsLayer` -- record timing and outcome (closest to the exchange)
#[must_use]
pub fn build_transport_stack(
    http: HttpService,
) -> impl Service<TransportRequest, Response = RawResponse, Error = TransportError, Future = TransportFuture>
       + Send
       + 'static {
    ServiceBuilder::new()
        .layer(TimeoutLayer)
        .layer(MetricsLayer)
        .service(http)
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// `TransportInvoker` backed by the HTTP stack and an owned worker runtime.
///
/// Every exchange runs on the runtime's worker threads; synchronous calls park
/// the caller until the outcome arrives. Async completions are handed to the
/// runtime's blocking pool. Outstanding exchanges resolve with
/// `TransportError::Cancelled` once the shutdown signal fires.
pub struct HttpTransport {
    runtime: Option<Runtime>,
    handle: Handle,
    http: HttpService,
    shutdown: watch::Receiver<bool>,
}

impl HttpTransport {
    /// Builds the transport and starts its worker runtime.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Init` if the runtime or HTTP client cannot be
    /// created.
    pub fn new(
        config: &ClientConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("pubsub-worker")
            .enable_all()
            .build()
            .map_err(|e| TransportError::Init(Box::new(e)))?;
        let handle = runtime.handle().clone();
        let http = HttpService::new(config)?;
        Ok(Self {
            runtime: Some(runtime),
            handle,
            http,
            shutdown,
        })
    }
}

impl HttpTransport {
    fn spawn_exchange(&self, request: TransportRequest, on_complete: Completion) {
        let stack = build_transport_stack(self.http.clone());
        let shutdown = self.shutdown.clone();
        self.handle.spawn(async move {
            let outcome = exchange(stack, request, shutdown).await;
            on_complete(outcome);
        });
    }
}

impl TransportInvoker for HttpTransport {
    fn execute_sync(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        // The exchange always runs on the worker runtime; the caller only
        // parks on the channel, so this is safe from any thread that is not
        // one of the runtime's core workers.
        let (tx, rx) = mpsc::sync_channel(1);
        self.spawn_exchange(
            request,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.recv().unwrap_or(Err(TransportError::Cancelled))
    }

    fn execute_async(&self, request: TransportRequest, on_complete: Completion) {
        // Completions run caller code, which may block (including a nested
        // `execute_sync`), so they never run on a core worker.
        self.spawn_exchange(
            request,
            Box::new(move |outcome| {
                tokio::task::spawn_blocking(move || on_complete(outcome));
            }),
        );
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            debug!("stopping transport worker runtime");
            runtime.shutdown_background();
        }
    }
}

/// Runs one exchange, resolving early with `Cancelled` on shutdown.
async fn exchange<S>(
    stack: S,
    request: TransportRequest,
    shutdown: watch::Receiver<bool>,
) -> Result<RawResponse, TransportError>
where
    S: Service<TransportRequest, Response = RawResponse, Error = TransportError>,
{
    if *shutdown.borrow() {
        return Err(TransportError::Cancelled);
    }
    tokio::select! {
        result = stack.oneshot(request) => result,
        () = cancelled(shutdown) => Err(TransportError::Cancelled),
    }
}

/// Resolves once the shutdown flag is set. Never resolves if the signal's
/// sender is gone without having fired.
async fn cancelled(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_when_signalled() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(cancelled(rx));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_stays_pending_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let result = tokio::time::timeout(Duration::from_millis(50), cancelled(rx)).await;
        assert!(result.is_err());
    }

    #[test]
    fn shutdown_before_call_cancels_sync_exchange() {
        let (tx, rx) = watch::channel(false);
        let transport = HttpTransport::new(&ClientConfig::with_subscribe_key("sub"), rx).unwrap();
        tx.send(true).unwrap();

        let request = crate::request::build_get(
            pubsub_core::OperationKind::WhereNow,
            &ClientConfig::with_subscribe_key("sub"),
            &["v2"],
        )
        .unwrap();
        let err = transport.execute_sync(request).unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
    }

    #[tokio::test]
    async fn transport_can_be_built_and_dropped_inside_a_runtime() {
        let (_tx, rx) = watch::channel(false);
        let transport = HttpTransport::new(&ClientConfig::with_subscribe_key("sub"), rx).unwrap();
        drop(transport);
    }
}
