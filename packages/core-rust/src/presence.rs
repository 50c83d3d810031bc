//! Presence operation results.

use serde::{Deserialize, Serialize};

/// Channels a UUID is currently present on, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereNowResult {
    pub channels: Vec<String>,
}

impl WhereNowResult {
    /// Decodes the `payload` section of a where-now response.
    ///
    /// Decoding is all-or-nothing: a missing `channels` field or any
    /// non-string element fails the whole payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error describing the first structural mismatch.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(payload)
    }
}
