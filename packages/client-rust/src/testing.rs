//! Test doubles shared by unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::request::TransportRequest;
use crate::transport::{Completion, RawResponse, TransportInvoker};

pub(crate) const WHERE_NOW_OK: &str = r#"{"status": 200, "message": "OK", "payload": {"channels": ["a","b"]}, "service": "Presence"}"#;

/// Records every request and answers with a canned response from a
/// separate thread for async calls.
pub(crate) struct StubTransport {
    status: u16,
    body: String,
    requests: Mutex<Vec<TransportRequest>>,
}

impl StubTransport {
    pub(crate) fn new(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn where_now_ok() -> Arc<Self> {
        Self::new(200, WHERE_NOW_OK)
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, request: TransportRequest) -> RawResponse {
        self.requests.lock().push(request);
        RawResponse::new(self.status, self.body.clone())
    }
}

impl TransportInvoker for StubTransport {
    fn execute_sync(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
        Ok(self.respond(request))
    }

    fn execute_async(&self, request: TransportRequest, on_complete: Completion) {
        let response = self.respond(request);
        std::thread::spawn(move || on_complete(Ok(response)));
    }
}
