//! Client lifecycle: shutdown signalling and in-flight call tracking.
//!
//! Uses `ArcSwap` for lock-free state transitions and an atomic counter with
//! RAII guards for in-flight call tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;

/// Client state, transitioned by [`ClientLifecycle`].
///
/// State machine: Running -> ShuttingDown -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Accepting new calls.
    Running,
    /// Shutdown requested: new calls are refused, outstanding ones are cancelled.
    ShuttingDown,
    /// Every in-flight call has delivered its outcome.
    Stopped,
}

/// Coordinates client shutdown with the transport and the dispatcher.
///
/// 1. The dispatcher checks `accepts_calls()` before starting a call
/// 2. Transports select on `shutdown_receiver()` to cancel outstanding exchanges
/// 3. `trigger_shutdown()` moves to `ShuttingDown` and signals all receivers
/// 4. `wait_for_drain()` waits until in-flight calls have delivered
#[derive(Debug)]
pub struct ClientLifecycle {
    shutdown_signal: watch::Sender<bool>,
    in_flight: Arc<AtomicU64>,
    state: Arc<ArcSwap<ClientState>>,
}

impl ClientLifecycle {
    /// Creates a lifecycle in the `Running` state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            shutdown_signal: tx,
            in_flight: Arc::new(AtomicU64::new(0)),
            state: Arc::new(ArcSwap::from_pointee(ClientState::Running)),
        }
    }

    /// Returns a receiver that observes `true` once shutdown is triggered.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_signal.subscribe()
    }

    /// Initiates shutdown.
    ///
    /// Transitions to `ShuttingDown` and signals all shutdown receivers.
    /// Calling it again has no further effect.
    pub fn trigger_shutdown(&self) {
        if self.state() == ClientState::Running {
            self.state.store(Arc::new(ClientState::ShuttingDown));
        }
        self.shutdown_signal.send_replace(true);
    }

    #[must_use]
    pub fn state(&self) -> ClientState {
        **self.state.load()
    }

    /// Whether new calls may start.
    #[must_use]
    pub fn accepts_calls(&self) -> bool {
        self.state() == ClientState::Running
    }

    /// Creates an RAII guard that tracks an in-flight call.
    ///
    /// The counter is incremented on creation and decremented when the guard
    /// is dropped, including during unwinding.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Waits for all in-flight calls to deliver, up to the given timeout.
    ///
    /// Returns `true` and transitions to `Stopped` if shutdown was triggered
    /// and everything drained. Returns `false` on timeout, or immediately if
    /// shutdown was never triggered.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        if self.state() == ClientState::Running {
            return false;
        }
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                self.state.store(Arc::new(ClientState::Stopped));
                return true;
            }

            if tokio::time::Instant::now() >= deadline {
                return false;
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Default for ClientLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that decrements the in-flight counter when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
