//! Operation builders, one module per service area.

pub mod presence;

pub use presence::WhereNow;
