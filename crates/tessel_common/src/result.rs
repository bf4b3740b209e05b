//! Common result and error types for the Tessel toolkit.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an internal error (a bug in Tessel), not a user-facing
/// problem. User-facing problems such as an architecture with no legal
/// location for a task are reported through crate-specific error enums and
/// the diagnostic sink.
pub type TesselResult<T> = Result<T, InternalError>;

/// An internal error indicating a broken invariant inside Tessel.
///
/// These errors should never occur during normal operation. If one does
/// occur, a working structure was mutated into a state that its own
/// construction rules forbid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
