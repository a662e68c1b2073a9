use std::time::Duration;

use folio_core::error::CoreError;
use folio_db::backend::BackendError;

/// Error returned by cached queries and mutations.
///
/// Cloneable because one coalesced fetch delivers the same result to every
/// caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<BackendError> for QueryError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Conflict(msg) => QueryError::Core(CoreError::Conflict(msg)),
            other => QueryError::Backend(other.to_string()),
        }
    }
}
