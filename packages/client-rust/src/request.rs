//! Transport request descriptors and the shared request builder.

use std::time::Duration;

use http::Method;
use pubsub_core::{ClientConfig, OperationKind, SDK_NAME};
use url::Url;

use crate::error::PubSubError;

/// Fully resolved request handed to a transport invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub operation: OperationKind,
    pub method: Method,
    /// Absolute URL with percent-encoded path and query.
    pub url: Url,
    /// Upper bound for the whole exchange, enforced by the transport.
    pub timeout: Duration,
}

impl TransportRequest {
    /// Encoded URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// All decoded values of a query parameter, in order.
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<String> {
        self.url
            .query_pairs()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }
}

/// Builds the request for `operation` at `segments` below the configured origin.
///
/// Each segment is percent-encoded on its own, so reserved characters in keys
/// or UUIDs cannot change the path structure. Adds the common query
/// parameters: `pnsdk`, the client `uuid`, and `auth` when an auth key is
/// configured. Deterministic in its inputs.
///
/// # Errors
///
/// Returns `PubSubError::InvalidArgument` when the configured origin does not
/// form a valid base URL.
pub fn build_get(
    operation: OperationKind,
    config: &ClientConfig,
    segments: &[&str],
) -> Result<TransportRequest, PubSubError> {
    let mut url = Url::parse(&config.base_url())
        .map_err(|e| PubSubError::invalid_argument(format!("invalid origin: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| PubSubError::invalid_argument("origin cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(segments);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("pnsdk", SDK_NAME);
        query.append_pair("uuid", &config.uuid);
        if let Some(auth) = config.auth_key() {
            query.append_pair("auth", auth);
        }
    }

    Ok(TransportRequest {
        operation,
        method: Method::GET,
        url,
        timeout: config.request_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        let mut config = ClientConfig::with_subscribe_key("mySubscribeKey");
        config.uuid = "myUUID".to_string();
        config
    }

    #[test]
    fn builds_path_from_segments() {
        let request = build_get(OperationKind::WhereNow, &config(), &["v2", "presence"]).unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path(), "/v2/presence");
        assert_eq!(request.url.scheme(), "https");
        assert_eq!(request.url.host_str(), Some("ps.pndsn.com"));
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    #[test]
    fn encodes_reserved_characters_per_segment() {
        let request =
            build_get(OperationKind::WhereNow, &config(), &["uuid", "a/b?c#d e%"]).unwrap();
        assert_eq!(request.path(), "/uuid/a%2Fb%3Fc%23d%20e%25");
        assert!(request.url.query().is_some_and(|q| !q.contains('#')));
        assert!(request.url.fragment().is_none());
    }

    #[test]
    fn auth_is_added_once_when_configured() {
        let mut config = config();
        config.auth_key = Some("myKey".to_string());
        let request = build_get(OperationKind::WhereNow, &config, &["v2"]).unwrap();
        assert_eq!(request.query_values("auth"), vec!["myKey"]);
    }

    #[test]
    fn auth_is_omitted_when_absent_or_empty() {
        let mut config = config();
        let request = build_get(OperationKind::WhereNow, &config, &["v2"]).unwrap();
        assert!(request.query_values("auth").is_empty());

        config.auth_key = Some(String::new());
        let request = build_get(OperationKind::WhereNow, &config, &["v2"]).unwrap();
        assert!(request.query_values("auth").is_empty());
    }

    #[test]
    fn common_query_parameters_are_present() {
        let request = build_get(OperationKind::WhereNow, &config(), &["v2"]).unwrap();
        assert_eq!(request.query_values("uuid"), vec!["myUUID"]);
        assert_eq!(request.query_values("pnsdk"), vec![SDK_NAME]);
    }

    #[test]
    fn building_is_deterministic() {
        let a = build_get(OperationKind::WhereNow, &config(), &["v2", "x"]).unwrap();
        let b = build_get(OperationKind::WhereNow, &config(), &["v2", "x"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let mut config = config();
        config.origin = "bad host:notaport".to_string();
        let err = build_get(OperationKind::WhereNow, &config, &["v2"]).unwrap_err();
        assert!(matches!(err, PubSubError::InvalidArgument { .. }));
    }
}
