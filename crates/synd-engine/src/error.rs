//! Error types for the export engine.

use synd_core::BoxedError;

/// Result type for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by an [`ContentUpdater`](crate::ContentUpdater)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// The store holds nothing under the requested identifier.
    #[error("content not found in store")]
    NotFound,

    #[error(transparent)]
    Other(#[from] BoxedError),
}

/// Errors raised by the export engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The enrichment API did not produce a payload.
    #[error("getting content for {uuid}: {source}")]
    GetContent { uuid: String, source: BoxedError },

    /// The store writer rejected the enriched payload.
    #[error("uploading content for {uuid}: {source}")]
    UploadContent { uuid: String, source: BoxedError },

    /// The store writer failed to delete the record.
    #[error("deleting content for {uuid}: {source}")]
    DeleteContent { uuid: String, source: BoxedError },

    /// Deleting a record the store never held; callers treat this as a
    /// tolerable outcome of repeated deletes.
    #[error("content {uuid} not found in store")]
    NotFound { uuid: String },

    /// The requested job is not in the registry.
    #[error("job not found")]
    JobNotFound,
}

impl Error {
    pub fn get_content(uuid: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::GetContent {
            uuid: uuid.into(),
            source: source.into(),
        }
    }

    pub fn upload_content(uuid: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::UploadContent {
            uuid: uuid.into(),
            source: source.into(),
        }
    }

    pub fn delete_content(uuid: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::DeleteContent {
            uuid: uuid.into(),
            source: source.into(),
        }
    }
}
