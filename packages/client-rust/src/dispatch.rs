//! Call orchestration shared by every operation and calling convention.
//!
//! Each call moves through `CallPhase`s: validate, build, send, decode, and
//! ends in exactly one of `Delivered` or `Failed`. The blocking, callback,
//! and future conventions all run the same validator, request builder, and
//! response decoder; only the way the outcome reaches the caller differs.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use pubsub_core::{ClientConfig, ConfigHandle, OperationKind};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::decode::{decode_response, Decoded};
use crate::error::PubSubError;
use crate::lifecycle::ClientLifecycle;
use crate::request::TransportRequest;
use crate::status::{Status, StatusContext};
use crate::transport::{RawResponse, TransportInvoker};
use crate::validate::validate;

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Per-operation hooks plugged into the shared dispatch skeleton.
pub trait Endpoint {
    /// Typed result of a successful call.
    type Output: Send + 'static;

    fn kind(&self) -> OperationKind;

    /// Operation-specific preconditions, checked after the common ones.
    ///
    /// # Errors
    ///
    /// Returns `PubSubError::InvalidArgument` for a missing or invalid parameter.
    fn validate(&self, _config: &ClientConfig) -> Result<(), PubSubError> {
        Ok(())
    }

    /// Builds the transport request. Only called after validation passed.
    ///
    /// # Errors
    ///
    /// Returns `PubSubError::InvalidArgument` if the request cannot be formed.
    fn build_request(&self, config: &ClientConfig) -> Result<TransportRequest, PubSubError>;

    /// Decodes the envelope's `payload` into the typed result.
    ///
    /// # Errors
    ///
    /// Returns `PubSubError::MalformedResponse` for a structurally invalid payload.
    fn decode_payload(payload: serde_json::Value) -> Result<Self::Output, PubSubError>;
}

// ---------------------------------------------------------------------------
// CallPhase
// ---------------------------------------------------------------------------

/// Progress of a single call, recorded in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Created,
    Validating,
    Building,
    Sending,
    Decoding,
    Delivered,
    Failed,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Sending => "sending",
            Self::Decoding => "decoding",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(operation: OperationKind, phase: CallPhase) {
    debug!(operation = %operation, phase = %phase, "call phase");
}

fn failed(operation: OperationKind, during: CallPhase, err: &PubSubError) {
    match err {
        PubSubError::InvalidArgument { .. } | PubSubError::Cancelled => {
            debug!(operation = %operation, during = %during, category = %err.category(), error = %err, "call failed");
        }
        _ => {
            warn!(operation = %operation, during = %during, category = %err.category(), error = %err, "call failed");
        }
    }
    enter(operation, CallPhase::Failed);
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs endpoints against the shared configuration and transport.
///
/// Cheap to clone; every operation builder carries one.
#[derive(Clone)]
pub struct Dispatcher {
    config: ConfigHandle,
    transport: Arc<dyn TransportInvoker>,
    lifecycle: Arc<ClientLifecycle>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

/// Outcome of the I/O-free part of a call.
struct Prepared {
    status: StatusContext,
    request: Result<TransportRequest, PubSubError>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        config: ConfigHandle,
        transport: Arc<dyn TransportInvoker>,
        lifecycle: Arc<ClientLifecycle>,
    ) -> Self {
        Self {
            config,
            transport,
            lifecycle,
        }
    }

    /// Snapshot, lifecycle check, validation, and request building.
    fn prepare<E: Endpoint>(&self, endpoint: &E) -> Prepared {
        let operation = endpoint.kind();
        enter(operation, CallPhase::Created);

        let config = self.config.snapshot();
        Prepared {
            status: StatusContext::new(operation, &config),
            request: self.build(endpoint, &config),
        }
    }

    fn build<E: Endpoint>(
        &self,
        endpoint: &E,
        config: &ClientConfig,
    ) -> Result<TransportRequest, PubSubError> {
        let operation = endpoint.kind();
        if !self.lifecycle.accepts_calls() {
            let err = PubSubError::Cancelled;
            failed(operation, CallPhase::Created, &err);
            return Err(err);
        }

        enter(operation, CallPhase::Validating);
        validate(endpoint, config).inspect_err(|err| failed(operation, CallPhase::Validating, err))?;

        enter(operation, CallPhase::Building);
        endpoint
            .build_request(config)
            .inspect_err(|err| failed(operation, CallPhase::Building, err))
    }

    /// Executes the call on the calling thread and returns its typed result.
    ///
    /// # Errors
    ///
    /// Returns the classified `PubSubError` of the first failing step. No
    /// partial result is ever returned.
    pub fn sync<E: Endpoint>(&self, endpoint: E) -> Result<E::Output, PubSubError> {
        let operation = endpoint.kind();
        // Counted before the lifecycle check so a concurrent drain cannot
        // report `Stopped` while this call is about to send.
        let _in_flight = self.lifecycle.in_flight_guard();
        let request = self.prepare(&endpoint).request?;

        enter(operation, CallPhase::Sending);
        let raw = self
            .transport
            .execute_sync(request)
            .map_err(PubSubError::from)
            .inspect_err(|err| failed(operation, CallPhase::Sending, err))?;

        let decoded = decode::<E>(operation, &raw)?;
        enter(operation, CallPhase::Delivered);
        Ok(decoded.value)
    }

    /// Executes the call without blocking and hands the outcome to `callback`.
    ///
    /// The callback runs exactly once. Validation and build failures invoke
    /// it immediately on the calling thread; every other outcome is
    /// delivered from a transport thread that may block. On failure the result is
    /// `None` and the status carries the error.
    pub fn async_with<E, F>(&self, endpoint: E, callback: F)
    where
        E: Endpoint + 'static,
        F: FnOnce(Option<E::Output>, Status) + Send + 'static,
    {
        let operation = endpoint.kind();
        let in_flight = self.lifecycle.in_flight_guard();
        let Prepared { status, request } = self.prepare(&endpoint);
        let delivery = Delivery::new(status, callback);

        let request = match request {
            Ok(request) => request,
            Err(err) => {
                delivery.fail(err, None);
                return;
            }
        };

        enter(operation, CallPhase::Sending);
        self.transport.execute_async(
            request,
            Box::new(move |outcome| {
                let _in_flight = in_flight;
                match outcome {
                    Ok(raw) => match decode::<E>(operation, &raw) {
                        Ok(decoded) => {
                            enter(operation, CallPhase::Delivered);
                            delivery.succeed(raw.status, decoded);
                        }
                        Err(err) => delivery.fail(err, Some(raw.status)),
                    },
                    Err(e) => {
                        let err = PubSubError::from(e);
                        failed(operation, CallPhase::Sending, &err);
                        delivery.fail(err, None);
                    }
                }
            }),
        );
    }

    /// Executes the call without blocking and returns a future of its outcome.
    ///
    /// The future resolves exactly once with the same `(result, status)` pair
    /// a callback would receive. It can be awaited on any runtime.
    pub fn future<E: Endpoint + 'static>(&self, endpoint: E) -> PendingCall<E::Output> {
        let operation = endpoint.kind();
        let (tx, rx) = oneshot::channel();
        self.async_with(endpoint, move |result, status| {
            let _ = tx.send((result, status));
        });
        PendingCall { operation, rx }
    }
}

fn decode<E: Endpoint>(
    operation: OperationKind,
    raw: &RawResponse,
) -> Result<Decoded<E::Output>, PubSubError> {
    enter(operation, CallPhase::Decoding);
    decode_response(raw, E::decode_payload)
        .inspect_err(|err| failed(operation, CallPhase::Decoding, err))
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

type Callback<T> = Box<dyn FnOnce(Option<T>, Status) + Send + 'static>;

/// Owns an async callback until it has been invoked.
///
/// Dropping an undelivered `Delivery` (e.g. the transport discarded the
/// completion during runtime teardown) invokes the callback with a
/// `Cancelled` status, so the callback runs exactly once on every path.
struct Delivery<T> {
    status: StatusContext,
    callback: Option<Callback<T>>,
}

impl<T> Delivery<T> {
    fn new<F>(status: StatusContext, callback: F) -> Self
    where
        F: FnOnce(Option<T>, Status) + Send + 'static,
    {
        Self {
            status,
            callback: Some(Box::new(callback)),
        }
    }

    fn succeed(mut self, status_code: u16, decoded: Decoded<T>) {
        if let Some(callback) = self.callback.take() {
            callback(Some(decoded.value), self.status.success(status_code, decoded.meta));
        }
    }

    fn fail(mut self, err: PubSubError, status_code: Option<u16>) {
        if let Some(callback) = self.callback.take() {
            callback(None, self.status.failure(err, status_code));
        }
    }
}

impl<T> Drop for Delivery<T> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            debug!("completion dropped before delivery, reporting cancellation");
            callback(None, self.status.failure(PubSubError::Cancelled, None));
        }
    }
}

// ---------------------------------------------------------------------------
// PendingCall
// ---------------------------------------------------------------------------

/// Future returned by [`Dispatcher::future`].
#[derive(Debug)]
#[must_use = "the call's outcome is lost if the future is dropped"]
pub struct PendingCall<T> {
    operation: OperationKind,
    rx: oneshot::Receiver<(Option<T>, Status)>,
}

impl<T> Future for PendingCall<T> {
    type Output = (Option<T>, Status);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_closed)) => Poll::Ready((
                None,
                StatusContext::detached(this.operation).failure(PubSubError::Cancelled, None),
            )),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
