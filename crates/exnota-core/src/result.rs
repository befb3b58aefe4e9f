//! Error-tag conventions shared by every boundary.
//!
//! Fallible operations return `Result<T, E>` where `E` is a closed set of
//! string tags. The tag is what crosses a process boundary and what the UI
//! branches and localizes on; it never carries a free-form message.

use std::fmt;

/// Tag of a successful reply on the wire.
pub const SUCCESS: &str = "success";

/// Reserved: the request never reached the background (or its answer never
/// came back). Produced only on the calling side.
pub const MESSAGING_ERROR: &str = "messaging-error";

/// Reserved: the background hit an internal fault while handling a request.
pub const UNKNOWN_ERROR: &str = "unknown-error";

/// A closed enumeration of error tags.
pub trait ErrorTag: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|variant| variant.as_str() == tag)
    }
}

/// Tag failures of the token repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage-error")]
    StorageError,
}

impl ErrorTag for RepositoryError {
    const ALL: &'static [Self] = &[RepositoryError::StorageError];

    fn as_str(&self) -> &'static str {
        match self {
            RepositoryError::StorageError => "storage-error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum SetTokenError {
    #[error("invalid-token")]
    InvalidToken,
    #[error("storage-error")]
    StorageError,
}

impl ErrorTag for SetTokenError {
    const ALL: &'static [Self] = &[SetTokenError::InvalidToken, SetTokenError::StorageError];

    fn as_str(&self) -> &'static str {
        match self {
            SetTokenError::InvalidToken => "invalid-token",
            SetTokenError::StorageError => "storage-error",
        }
    }
}

impl From<RepositoryError> for SetTokenError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StorageError => SetTokenError::StorageError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ClientIdError {
    #[error("fetching-client-id")]
    FetchingClientId,
}

impl ErrorTag for ClientIdError {
    const ALL: &'static [Self] = &[ClientIdError::FetchingClientId];

    fn as_str(&self) -> &'static str {
        match self {
            ClientIdError::FetchingClientId => "fetching-client-id",
        }
    }
}

/// Outcome classes of a Notion API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum NotionError {
    #[error("notion-invalid-token")]
    InvalidToken,
    #[error("notion-rate-limit-error")]
    RateLimit,
    /// An error likely inside our control.
    #[error("notion-request-error")]
    Request,
    /// An error likely outside our control.
    #[error("notion-other-error")]
    Other,
    #[error("unknown-error")]
    Unknown,
}

impl NotionError {
    /// Whether repeating the call after a pause is sensible.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotionError::RateLimit)
    }
}

impl ErrorTag for NotionError {
    const ALL: &'static [Self] = &[
        NotionError::InvalidToken,
        NotionError::RateLimit,
        NotionError::Request,
        NotionError::Other,
        NotionError::Unknown,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            NotionError::InvalidToken => "notion-invalid-token",
            NotionError::RateLimit => "notion-rate-limit-error",
            NotionError::Request => "notion-request-error",
            NotionError::Other => "notion-other-error",
            NotionError::Unknown => UNKNOWN_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ConnectError {
    /// The exchange worked but the user shared no pages with the integration.
    #[error("no-pages-granted")]
    NoPagesGranted,
    #[error("{0}")]
    Notion(NotionError),
    /// The grant was issued but could not be persisted.
    #[error("storage-error")]
    StorageError,
}

impl ErrorTag for ConnectError {
    const ALL: &'static [Self] = &[
        ConnectError::NoPagesGranted,
        ConnectError::Notion(NotionError::InvalidToken),
        ConnectError::Notion(NotionError::RateLimit),
        ConnectError::Notion(NotionError::Request),
        ConnectError::Notion(NotionError::Other),
        ConnectError::Notion(NotionError::Unknown),
        ConnectError::StorageError,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ConnectError::NoPagesGranted => "no-pages-granted",
            ConnectError::Notion(err) => err.as_str(),
            ConnectError::StorageError => "storage-error",
        }
    }
}

impl From<NotionError> for ConnectError {
    fn from(err: NotionError) -> Self {
        ConnectError::Notion(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_closed_set<E: ErrorTag>() {
        let mut seen = HashSet::new();
        for variant in E::ALL {
            let tag = variant.as_str();
            assert!(seen.insert(tag), "duplicate tag {tag}");
            assert_ne!(tag, SUCCESS);
            assert_ne!(tag, MESSAGING_ERROR);
            assert_eq!(E::from_tag(tag), Some(*variant));
        }
        assert_eq!(E::from_tag("no-such-tag"), None);
    }

    #[test]
    fn test_tags_are_closed_and_parseable() {
        assert_closed_set::<RepositoryError>();
        assert_closed_set::<SetTokenError>();
        assert_closed_set::<ClientIdError>();
        assert_closed_set::<NotionError>();
        assert_closed_set::<ConnectError>();
    }

    #[test]
    fn test_display_matches_tag() {
        assert_eq!(NotionError::RateLimit.to_string(), "notion-rate-limit-error");
        assert_eq!(
            ConnectError::Notion(NotionError::InvalidToken).to_string(),
            "notion-invalid-token"
        );
        assert_eq!(ConnectError::NoPagesGranted.to_string(), "no-pages-granted");
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        let retryable: Vec<_> = NotionError::ALL
            .iter()
            .filter(|err| err.is_retryable())
            .collect();
        assert_eq!(retryable, vec![&NotionError::RateLimit]);
    }
}
