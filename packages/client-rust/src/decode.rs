//! Response decoding: raw response -> envelope -> typed result.

use pubsub_core::{Envelope, ResponseMeta};
use tracing::debug;

use crate::error::PubSubError;
use crate::transport::RawResponse;

/// Typed result plus the server diagnostics it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub meta: ResponseMeta,
}

/// Decodes a raw response, delegating the payload to `decode_payload`.
///
/// Checks run in a fixed order and the first failure wins:
/// 1. non-2xx status -> `HttpError`, the body is never inspected
/// 2. body is not a well-formed envelope -> `MalformedResponse`
/// 3. payload absent or `null` -> `MissingPayload`
/// 4. payload rejected by `decode_payload` -> its error
///
/// # Errors
///
/// Returns the classified `PubSubError` for the first failing check.
pub fn decode_response<T, F>(raw: &RawResponse, decode_payload: F) -> Result<Decoded<T>, PubSubError>
where
    F: FnOnce(serde_json::Value) -> Result<T, PubSubError>,
{
    if !raw.is_success() {
        debug!(
            status = raw.status,
            body_len = raw.body.len(),
            "non-success status, skipping body"
        );
        return Err(PubSubError::HttpError { code: raw.status });
    }

    let envelope = Envelope::from_slice(&raw.body).map_err(PubSubError::malformed)?;
    let (meta, payload) = envelope.into_parts();
    let payload = payload.ok_or(PubSubError::MissingPayload)?;
    let value = decode_payload(payload)?;

    Ok(Decoded { value, meta })
}

#[cfg(test)]
mod tests {
    use pubsub_core::WhereNowResult;

    use super::*;

    const SUCCESS: &str = r#"{"status": 200, "message": "OK", "payload": {"channels": ["a","b"]}, "service": "Presence"}"#;

    fn where_now(raw: &RawResponse) -> Result<Decoded<WhereNowResult>, PubSubError> {
        decode_response(raw, |payload| {
            WhereNowResult::from_payload(payload).map_err(PubSubError::malformed)
        })
    }

    #[test]
    fn decodes_success_envelope() {
        let decoded = where_now(&RawResponse::new(200, SUCCESS)).unwrap();
        assert_eq!(decoded.value.channels, vec!["a", "b"]);
        assert_eq!(decoded.meta.status, Some(200));
        assert_eq!(decoded.meta.message.as_deref(), Some("OK"));
        assert_eq!(decoded.meta.service.as_deref(), Some("Presence"));
    }

    #[test]
    fn non_2xx_fails_even_with_success_body() {
        for code in [400, 403, 404, 500, 302] {
            let err = where_now(&RawResponse::new(code, SUCCESS)).unwrap_err();
            assert!(
                matches!(err, PubSubError::HttpError { code: c } if c == code),
                "{code}: {err}"
            );
        }
    }

    #[test]
    fn non_2xx_wins_over_malformed_body() {
        let err = where_now(&RawResponse::new(404, "not json")).unwrap_err();
        assert!(matches!(err, PubSubError::HttpError { code: 404 }));
    }

    #[test]
    fn any_2xx_is_decoded() {
        let decoded = where_now(&RawResponse::new(203, SUCCESS)).unwrap();
        assert_eq!(decoded.value.channels, vec!["a", "b"]);
    }

    #[test]
    fn unquoted_element_is_malformed() {
        let body = r#"{"status": 200, "message": "OK", "payload": {"channels": [zimp]}, "service": "Presence"}"#;
        let err = where_now(&RawResponse::new(200, body)).unwrap_err();
        assert!(matches!(err, PubSubError::MalformedResponse { .. }));
    }

    #[test]
    fn unquoted_array_is_malformed() {
        let body = r#"{"status": 200, "message": "OK", "payload": {"channels": zimp}, "service": "Presence"}"#;
        let err = where_now(&RawResponse::new(200, body)).unwrap_err();
        assert!(matches!(err, PubSubError::MalformedResponse { .. }));
    }

    #[test]
    fn non_string_element_is_malformed() {
        let body = r#"{"status": 200, "payload": {"channels": ["a", 7, "b"]}}"#;
        let err = where_now(&RawResponse::new(200, body)).unwrap_err();
        assert!(matches!(err, PubSubError::MalformedResponse { .. }));
    }

    #[test]
    fn empty_body_is_malformed() {
        let err = where_now(&RawResponse::new(200, "")).unwrap_err();
        assert!(matches!(err, PubSubError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_payload_is_reported() {
        let body = r#"{"status": 200, "message": "OK", "service": "Presence"}"#;
        let err = where_now(&RawResponse::new(200, body)).unwrap_err();
        assert!(matches!(err, PubSubError::MissingPayload));
    }

    #[test]
    fn null_payload_is_reported_as_missing() {
        let body = r#"{"status": 200, "payload": null}"#;
        let err = where_now(&RawResponse::new(200, body)).unwrap_err();
        assert!(matches!(err, PubSubError::MissingPayload));
    }

    #[test]
    fn null_error_field_keeps_channels() {
        let body = r#"{"status":200,"message":"OK","error":null,"payload":{"channels":["a","b"]},"service":"Presence"}"#;
        let decoded = where_now(&RawResponse::new(200, body)).unwrap();
        assert_eq!(decoded.value.channels, vec!["a", "b"]);
    }

    #[test]
    fn string_error_field_without_payload_is_missing_payload() {
        let body = r#"{"status":200,"message":"OK","error":"none","service":"Presence"}"#;
        let err = where_now(&RawResponse::new(200, body)).unwrap_err();
        assert!(matches!(err, PubSubError::MissingPayload), "{err}");
    }

    #[test]
    fn payload_hook_is_not_called_on_earlier_failure() {
        let result: Result<Decoded<()>, _> =
            decode_response(&RawResponse::new(500, SUCCESS), |_| -> Result<(), PubSubError> {
                panic!("payload decoder must not run for non-2xx responses")
            });
        assert!(result.is_err());
    }
}
