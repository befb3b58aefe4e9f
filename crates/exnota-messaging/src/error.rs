use std::fmt;

use exnota_core::result::{ErrorTag, MESSAGING_ERROR, UNKNOWN_ERROR};

/// Failure seen by the UI for a call to message with error tags `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError<E> {
    /// The background answered with a domain failure.
    Domain(E),
    /// The background hit an internal fault while handling the request.
    Internal,
    /// The request never reached a handler, or its reply never came back.
    Messaging,
}

impl<E: ErrorTag> CallError<E> {
    pub fn tag(&self) -> &'static str {
        match self {
            CallError::Domain(err) => err.as_str(),
            CallError::Internal => UNKNOWN_ERROR,
            CallError::Messaging => MESSAGING_ERROR,
        }
    }

    pub fn domain(&self) -> Option<E> {
        match self {
            CallError::Domain(err) => Some(*err),
            _ => None,
        }
    }
}

impl<E: ErrorTag> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl<E: ErrorTag> std::error::Error for CallError<E> {}

/// The transport could not deliver a request or bring back its reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("background is not reachable: {0}")]
    Unreachable(String),
    #[error("connection closed before a reply arrived")]
    Closed,
    #[error("background rejected the request: {0}")]
    Rejected(String),
    #[error("bad frame: {0}")]
    Codec(String),
}

/// Why the dispatcher refused a request before any handler ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for {0}")]
    UnknownMessage(String),
    #[error("invalid input for {name}: {reason}")]
    InvalidInput { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("a handler for {0} is already registered")]
    Duplicate(&'static str),
}

/// A reply that does not follow the status wire format.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("reply has no status field")]
    MissingStatus,
    #[error("reply status {0:?} is not a known tag for this message")]
    UnknownTag(String),
    #[error("success payload must be a JSON object")]
    NotAnObject,
    #[error("success payload may not contain a status field")]
    ReservedField,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use exnota_core::result::{NotionError, RepositoryError};

    use super::*;

    #[test]
    fn test_call_error_tags() {
        assert_eq!(
            CallError::Domain(RepositoryError::StorageError).tag(),
            "storage-error"
        );
        assert_eq!(CallError::<NotionError>::Internal.tag(), "unknown-error");
        assert_eq!(CallError::<NotionError>::Messaging.tag(), "messaging-error");
        assert_eq!(CallError::<NotionError>::Messaging.to_string(), "messaging-error");
        assert_eq!(CallError::<NotionError>::Messaging.domain(), None);
        assert_eq!(
            CallError::Domain(NotionError::RateLimit).domain(),
            Some(NotionError::RateLimit)
        );
    }
}
