//! Presence operations.

use pubsub_core::{ClientConfig, OperationKind, WhereNowResult};

use crate::dispatch::{Dispatcher, Endpoint, PendingCall};
use crate::error::PubSubError;
use crate::request::{build_get, TransportRequest};
use crate::status::Status;
use crate::validate::resolve_uuid;

/// Looks up the channels a UUID is currently present on.
///
/// Path: `/v2/presence/sub-key/{subscribe_key}/uuid/{uuid}`. The UUID
/// defaults to the client's own; override it with [`WhereNow::uuid`].
#[derive(Debug, Clone)]
#[must_use = "a where-now request does nothing until executed"]
pub struct WhereNow {
    dispatcher: Dispatcher,
    uuid: Option<String>,
}

impl WhereNow {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            uuid: None,
        }
    }

    /// Looks up `uuid` instead of the client's configured UUID.
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Executes the lookup, blocking the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the classified `PubSubError` of the first failing step.
    pub fn sync(self) -> Result<WhereNowResult, PubSubError> {
        let dispatcher = self.dispatcher.clone();
        dispatcher.sync(self)
    }

    /// Executes the lookup in the background; `callback` runs exactly once.
    pub fn async_with<F>(self, callback: F)
    where
        F: FnOnce(Option<WhereNowResult>, Status) + Send + 'static,
    {
        let dispatcher = self.dispatcher.clone();
        dispatcher.async_with(self, callback);
    }

    /// Executes the lookup in the background and returns a future of its outcome.
    pub fn future(self) -> PendingCall<WhereNowResult> {
        let dispatcher = self.dispatcher.clone();
        dispatcher.future(self)
    }
}

impl Endpoint for WhereNow {
    type Output = WhereNowResult;

    fn kind(&self) -> OperationKind {
        OperationKind::WhereNow
    }

    fn validate(&self, config: &ClientConfig) -> Result<(), PubSubError> {
        resolve_uuid(self.uuid.as_deref(), config).map(|_| ())
    }

    fn build_request(&self, config: &ClientConfig) -> Result<TransportRequest, PubSubError> {
        let subscribe_key = config
            .subscribe_key()
            .ok_or_else(|| PubSubError::invalid_argument("subscribe key not configured"))?;
        let uuid = resolve_uuid(self.uuid.as_deref(), config)?;
        build_get(
            self.kind(),
            config,
            &["v2", "presence", "sub-key", subscribe_key, "uuid", uuid],
        )
    }

    fn decode_payload(payload: serde_json::Value) -> Result<WhereNowResult, PubSubError> {
        WhereNowResult::from_payload(payload).map_err(PubSubError::malformed)
    }
}
