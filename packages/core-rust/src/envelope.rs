//! Generic response envelope shared by non-subscribe endpoints.
//!
//! Wire shape: `{"status": 200, "message": "OK", "service": "Presence", "payload": {...}}`.
//! Every field is optional on the wire; which ones an operation requires is
//! decided by the response decoder, not here.

use serde::{Deserialize, Serialize};

/// Decoded envelope with the operation-specific `payload` left undecoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    /// `None` when the field is absent or `null`.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl Envelope {
    /// Parses an envelope from a raw response body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body is not a JSON object with
    /// correctly typed envelope fields.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Splits the envelope into server diagnostics and the raw payload.
    #[must_use]
    pub fn into_parts(self) -> (ResponseMeta, Option<serde_json::Value>) {
        let meta = ResponseMeta {
            status: self.status,
            message: self.message,
            service: self.service,
        };
        (meta, self.payload)
    }
}

/// Server-reported diagnostics carried in a success `Status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub status: Option<u16>,
    pub message: Option<String>,
    pub service: Option<String>,
}
