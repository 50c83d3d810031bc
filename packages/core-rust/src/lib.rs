//! Pub/sub client core: configuration snapshots, the wire envelope, and
//! typed operation results.

pub mod config;
pub mod envelope;
pub mod operation;
pub mod presence;

pub use config::{ClientConfig, ConfigHandle};
pub use envelope::{Envelope, ResponseMeta};
pub use operation::OperationKind;
pub use presence::WhereNowResult;

/// SDK identifier sent with every request as the `pnsdk` query parameter.
pub const SDK_NAME: &str = concat!("PubSub-Rust/", env!("CARGO_PKG_VERSION"));
