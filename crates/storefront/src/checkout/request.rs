//! Per-operation request state.

use serde::Serialize;

/// Lifecycle of one remote operation (loading data, submitting the order).
///
/// Replaces a loading flag plus an error string: a `Pending` submission is
/// what rejects a second concurrent `place_order`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl RequestState {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Failure message, if the last attempt failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}
