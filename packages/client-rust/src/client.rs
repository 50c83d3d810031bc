//! Client entry point.

use std::sync::Arc;
use std::time::Duration;

use pubsub_core::{ClientConfig, ConfigHandle};
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::endpoints::WhereNow;
use crate::error::PubSubError;
use crate::lifecycle::{ClientLifecycle, ClientState};
use crate::transport::{HttpTransport, TransportInvoker};

/// Pub/sub service client.
///
/// Owns the shared configuration, the transport, and the lifecycle. Every
/// operation builder it hands out reads a fresh configuration snapshot when
/// executed, so `update_config` affects subsequent calls only.
#[derive(Debug)]
pub struct PubSubClient {
    config: ConfigHandle,
    lifecycle: Arc<ClientLifecycle>,
    dispatcher: Dispatcher,
}

impl PubSubClient {
    /// Creates a client using the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `PubSubError::Transport` if the transport cannot be initialized.
    pub fn new(config: ClientConfig) -> Result<Self, PubSubError> {
        let lifecycle = Arc::new(ClientLifecycle::new());
        let transport = HttpTransport::new(&config, lifecycle.shutdown_receiver())?;
        info!(origin = %config.origin, secure = config.secure, "pub/sub client created");
        Ok(Self::with_transport(config, lifecycle, Arc::new(transport)))
    }

    /// Creates a client over a caller-supplied transport.
    ///
    /// The transport should observe `lifecycle.shutdown_receiver()` to cancel
    /// outstanding exchanges on shutdown.
    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        lifecycle: Arc<ClientLifecycle>,
        transport: Arc<dyn TransportInvoker>,
    ) -> Self {
        let config = ConfigHandle::new(config);
        let dispatcher = Dispatcher::new(config.clone(), transport, Arc::clone(&lifecycle));
        Self {
            config,
            lifecycle,
            dispatcher,
        }
    }

    /// Starts a where-now lookup for the client's UUID.
    pub fn where_now(&self) -> WhereNow {
        WhereNow::new(self.dispatcher.clone())
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<ClientConfig> {
        self.config.snapshot()
    }

    /// Atomically replaces the configuration with a modified copy.
    pub fn update_config<F>(&self, f: F)
    where
        F: FnMut(&mut ClientConfig),
    {
        self.config.update(f);
    }

    #[must_use]
    pub fn state(&self) -> ClientState {
        self.lifecycle.state()
    }

    /// Refuses new calls and cancels outstanding ones.
    ///
    /// Every pending async call is delivered a `Cancelled` status.
    pub fn shutdown(&self) {
        info!(in_flight = self.lifecycle.in_flight_count(), "pub/sub client shutting down");
        self.lifecycle.trigger_shutdown();
    }

    /// Waits until every in-flight call has delivered after `shutdown()`.
    ///
    /// Returns `false` if shutdown was not triggered or the timeout expired.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        self.lifecycle.wait_for_drain(timeout).await
    }
}
