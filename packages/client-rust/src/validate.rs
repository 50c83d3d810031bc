//! Pre-flight validation, run before any request is built or sent.

use pubsub_core::ClientConfig;

use crate::dispatch::Endpoint;
use crate::error::PubSubError;

/// Checks the preconditions shared by every operation, then the endpoint's own.
///
/// Pure and idempotent: it only reads the configuration snapshot.
///
/// # Errors
///
/// Returns `PubSubError::InvalidArgument` when the subscribe key is absent or
/// empty, or when the endpoint reports a missing required parameter.
pub fn validate<E: Endpoint>(endpoint: &E, config: &ClientConfig) -> Result<(), PubSubError> {
    if config.subscribe_key().is_none() {
        return Err(PubSubError::invalid_argument("subscribe key not configured"));
    }
    endpoint.validate(config)
}

/// Resolves a UUID parameter: a non-empty override wins, else the configured UUID.
///
/// # Errors
///
/// Returns `PubSubError::InvalidArgument` when both are empty.
pub fn resolve_uuid<'a>(
    override_uuid: Option<&'a str>,
    config: &'a ClientConfig,
) -> Result<&'a str, PubSubError> {
    override_uuid
        .filter(|uuid| !uuid.is_empty())
        .or_else(|| Some(config.uuid.as_str()).filter(|uuid| !uuid.is_empty()))
        .ok_or_else(|| PubSubError::invalid_argument("uuid not configured"))
}
