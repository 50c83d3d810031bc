//! Client configuration and the shared, lock-free configuration handle.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

/// Process-wide client configuration.
///
/// Operations never mutate it: each call reads one immutable snapshot through
/// [`ConfigHandle::snapshot`] and uses it for validation and request building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Key identifying the keyset for read operations. Required by every call.
    pub subscribe_key: Option<String>,
    /// Key identifying the keyset for write operations.
    pub publish_key: Option<String>,
    /// Access token sent as the `auth` query parameter when present.
    pub auth_key: Option<String>,
    /// Identity of this client. Defaults to `pn-<random uuid v4>`.
    pub uuid: String,
    /// Host (and optional port) of the service, without scheme.
    pub origin: String,
    /// Use `https` when true, `http` otherwise.
    pub secure: bool,
    /// Maximum time to establish a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Maximum time for a whole non-subscribe request/response exchange.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            subscribe_key: None,
            publish_key: None,
            auth_key: None,
            uuid: format!("pn-{}", uuid::Uuid::new_v4()),
            origin: "ps.pndsn.com".to_string(),
            secure: true,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given subscribe key with all other
    /// fields at their defaults.
    #[must_use]
    pub fn with_subscribe_key(subscribe_key: impl Into<String>) -> Self {
        Self {
            subscribe_key: Some(subscribe_key.into()),
            ..Self::default()
        }
    }

    /// Scheme used for requests, derived from `secure`.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL (`scheme://origin`) requests are addressed to.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.origin)
    }

    /// Returns the subscribe key when it is set and non-empty.
    #[must_use]
    pub fn subscribe_key(&self) -> Option<&str> {
        non_empty(self.subscribe_key.as_deref())
    }

    /// Returns the auth key when it is set and non-empty.
    #[must_use]
    pub fn auth_key(&self) -> Option<&str> {
        non_empty(self.auth_key.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Shared handle to the current configuration.
///
/// Readers take cheap `Arc` snapshots without locking; writers replace the
/// whole configuration atomically. In-flight calls keep the snapshot they
/// started with.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<ClientConfig>>,
}

impl ConfigHandle {
    /// Wraps an initial configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Returns the current configuration snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ClientConfig> {
        self.inner.load_full()
    }

    /// Replaces the configuration with a modified copy of the current one.
    pub fn update<F>(&self, mut f: F)
    where
        F: FnMut(&mut ClientConfig),
    {
        self.inner.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            f(&mut next);
            next
        });
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert!(config.subscribe_key.is_none());
        assert!(config.auth_key.is_none());
        assert!(config.uuid.starts_with("pn-"));
        assert_eq!(config.origin, "ps.pndsn.com");
        assert!(config.secure);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn default_uuids_are_unique() {
        assert_ne!(ClientConfig::default().uuid, ClientConfig::default().uuid);
    }

    #[test]
    fn base_url_follows_secure_flag() {
        let mut config = ClientConfig::with_subscribe_key("sub");
        assert_eq!(config.base_url(), "https://ps.pndsn.com");

        config.secure = false;
        config.origin = "127.0.0.1:8080".to_string();
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn empty_keys_read_as_absent() {
        let mut config = ClientConfig::with_subscribe_key("");
        config.auth_key = Some(String::new());
        assert_eq!(config.subscribe_key(), None);
        assert_eq!(config.auth_key(), None);

        config.subscribe_key = Some("sub".to_string());
        config.auth_key = Some("auth".to_string());
        assert_eq!(config.subscribe_key(), Some("sub"));
        assert_eq!(config.auth_key(), Some("auth"));
    }

    #[test]
    fn snapshots_are_isolated_from_updates() {
        let handle = ConfigHandle::new(ClientConfig::with_subscribe_key("before"));
        let before = handle.snapshot();

        handle.update(|c| c.subscribe_key = Some("after".to_string()));

        assert_eq!(before.subscribe_key(), Some("before"));
        assert_eq!(handle.snapshot().subscribe_key(), Some("after"));
    }

    #[test]
    fn cloned_handles_share_state() {
        let handle = ConfigHandle::default();
        let other = handle.clone();

        other.update(|c| c.auth_key = Some("myKey".to_string()));
        assert_eq!(handle.snapshot().auth_key(), Some("myKey"));
    }
}
