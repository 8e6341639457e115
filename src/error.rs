//! Error types shared by every stream operation.
//!
//! A stream has exactly one failure shape: a terminal [`StreamError`] carried by
//! `Halt(Some(error))`. Configuration problems are reported separately through
//! [`ConfigError`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Terminal failure carried by a halted stream.
///
/// Cheap to clone so the same failure can be reported to the driver after the
/// stop chain has been unwound.
#[derive(Clone, Error)]
pub enum StreamError {
    /// An arbitrary error raised by user code or a batch source.
    #[error("{0}")]
    Raised(Arc<dyn std::error::Error + Send + Sync + 'static>),
    /// A plain message error.
    #[error("{0}")]
    Message(Arc<str>),
    /// Consumption was canceled through a [`CancelFlag`](crate::CancelFlag).
    #[error("stream consumption was canceled")]
    Canceled,
    /// A batch cursor was pulled after reporting that it had no more items.
    #[error("batch cursor pulled past its end")]
    Exhausted,
    /// An effect produced a value of a different type than its node promised.
    #[error("effect produced a value of an unexpected type, expected `{expected}`")]
    TypeMismatch { expected: &'static str },
}

impl StreamError {
    /// Wraps any error type.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StreamError::Raised(Arc::new(error))
    }

    /// Creates an error from a message.
    pub fn msg(message: impl Into<Arc<str>>) -> Self {
        StreamError::Message(message.into())
    }

    /// Returns `true` if this error signals cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, StreamError::Canceled)
    }

    /// Attempts to view a [`StreamError::Raised`] payload as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            StreamError::Raised(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl fmt::Debug for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Raised(inner) => f.debug_tuple("Raised").field(inner).finish(),
            StreamError::Message(message) => f.debug_tuple("Message").field(message).finish(),
            StreamError::Canceled => f.write_str("Canceled"),
            StreamError::Exhausted => f.write_str("Exhausted"),
            StreamError::TypeMismatch { expected } => f
                .debug_struct("TypeMismatch")
                .field("expected", expected)
                .finish(),
        }
    }
}

// Raised payloads compare by identity: the same failure observed twice is equal,
// two distinct failures with equal text are not.
impl PartialEq for StreamError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (StreamError::Raised(a), StreamError::Raised(b)) => Arc::ptr_eq(a, b),
            (StreamError::Message(a), StreamError::Message(b)) => a == b,
            (StreamError::Canceled, StreamError::Canceled) => true,
            (StreamError::Exhausted, StreamError::Exhausted) => true,
            (
                StreamError::TypeMismatch { expected: a },
                StreamError::TypeMismatch { expected: b },
            ) => a == b,
            _ => false,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(error: std::io::Error) -> Self {
        StreamError::new(error)
    }
}

/// Invalid stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("batch size must be greater than zero, got {0}")]
    InvalidBatchSize(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_message_errors_compare_by_text() {
        assert_eq!(StreamError::msg("boom"), StreamError::msg("boom"));
        assert_ne!(StreamError::msg("boom"), StreamError::msg("bang"));
        assert_ne!(StreamError::msg("boom"), StreamError::Canceled);
    }

    #[test]
    fn test_raised_errors_compare_by_identity() {
        let error = StreamError::new(DiskError);
        assert_eq!(error.clone(), error);
        assert_ne!(StreamError::new(DiskError), StreamError::new(DiskError));
    }

    #[test]
    fn test_downcast_raised_payload() {
        let error = StreamError::new(DiskError);
        assert!(error.downcast_ref::<DiskError>().is_some());
        assert_eq!(error.to_string(), "disk on fire");
        assert!(StreamError::msg("x").downcast_ref::<DiskError>().is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let error: StreamError = std::io::Error::other("pipe closed").into();
        assert!(error.downcast_ref::<std::io::Error>().is_some());
        assert!(!error.is_canceled());
        assert!(StreamError::Canceled.is_canceled());
    }
}
