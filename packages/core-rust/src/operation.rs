use std::fmt;

/// Kind of API call an operation performs.
///
/// Carried in every `Status` so callers can tell which operation a delivery
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationKind {
    /// Presence lookup: channels a UUID is currently present on.
    WhereNow,
}

impl OperationKind {
    /// Stable name used in logs and diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhereNow => "where_now",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
