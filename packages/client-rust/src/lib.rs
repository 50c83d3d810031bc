//! Pub/sub client: request validation, dispatch over blocking, callback and
//! future conventions, HTTP transport, and response decoding.

pub mod client;
pub mod decode;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod lifecycle;
pub mod request;
pub mod status;
pub mod transport;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use client::PubSubClient;
pub use dispatch::{Dispatcher, Endpoint, PendingCall};
pub use endpoints::WhereNow;
pub use error::{PubSubError, TransportError};
pub use lifecycle::{ClientLifecycle, ClientState};
pub use pubsub_core::{ClientConfig, WhereNowResult};
pub use status::{Status, StatusCategory};
pub use transport::{HttpTransport, RawResponse, TransportInvoker};
