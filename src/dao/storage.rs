use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(
        message: String,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Outcome of a conditional `update_*_where` call.
///
/// `matched` counts the records the filter matched at the instant the write
/// was applied. Zero matches is the silent-drop path racing writers rely on,
/// so it is reported rather than raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Number of records the filter matched (and the patch was applied to).
    pub matched: usize,
}

impl WriteOutcome {
    /// True when at least one record matched the filter.
    pub fn any(&self) -> bool {
        self.matched > 0
    }
}

/// Outcome of an `insert_*` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Identifiers of the inserted records, in insertion order.
    pub inserted_ids: Vec<Uuid>,
}
