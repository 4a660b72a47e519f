//! Per-item export operation and the capability seams it relies on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use synd_core::{BoxedError, Stub};
use tokio::sync::mpsc;

use crate::error::UpdaterError;
use crate::{Error, Result, TRACING_TARGET_EXPORT};

/// Produces the enriched payload for a content identifier.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn get_content(&self, uuid: &str, tid: &str) -> Result<Bytes, BoxedError>;
}

/// Writes enriched payloads to, and removes them from, the object store.
#[async_trait]
pub trait ContentUpdater: Send + Sync {
    async fn upload(&self, payload: Bytes, tid: &str, uuid: &str, date: &str)
    -> Result<(), UpdaterError>;

    async fn delete(&self, uuid: &str, tid: &str) -> Result<(), UpdaterError>;
}

/// A finite, lazily produced batch of export candidates.
///
/// `stubs` is a single-consumer stream backed by a live store cursor; it is
/// not restartable, and dropping the receiver releases the cursor.
pub struct Inquiry {
    pub stubs: mpsc::Receiver<Stub>,
    pub count: usize,
}

/// Queries the document store for export candidates.
#[async_trait]
pub trait Inquirer: Send + Sync {
    /// Starts a streaming query. `candidates` narrows the scan to an
    /// explicit identifier set; an empty slice scans the whole collection.
    /// The stream is closed once `timeout` elapses.
    async fn inquire(&self, timeout: Duration, candidates: Vec<String>)
    -> Result<Inquiry, BoxedError>;
}

/// Stateless per-item export operation.
///
/// Fetches the enriched payload for a stub and hands it to the store writer,
/// or deletes a record by identifier. Safe for concurrent use; the whole
/// worker pool shares one instance.
pub struct Exporter {
    fetcher: Arc<dyn ContentFetcher>,
    updater: Arc<dyn ContentUpdater>,
}

impl Exporter {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, updater: Arc<dyn ContentUpdater>) -> Self {
        Self { fetcher, updater }
    }

    /// Exports one record: fetch the enriched payload, upload it keyed by
    /// uuid and publish date.
    pub async fn export(&self, tid: &str, stub: &Stub) -> Result<()> {
        let payload = self
            .fetcher
            .get_content(&stub.uuid, tid)
            .await
            .map_err(|err| Error::get_content(&stub.uuid, err))?;

        self.updater
            .upload(payload, tid, &stub.uuid, &stub.date)
            .await
            .map_err(|err| Error::upload_content(&stub.uuid, err))?;

        tracing::debug!(
            target: TRACING_TARGET_EXPORT,
            tid,
            uuid = %stub.uuid,
            date = %stub.date,
            "Exported content"
        );
        Ok(())
    }

    /// Removes one record from the store.
    pub async fn delete(&self, uuid: &str, tid: &str) -> Result<()> {
        match self.updater.delete(uuid, tid).await {
            Ok(()) => {
                tracing::debug!(target: TRACING_TARGET_EXPORT, tid, uuid, "Deleted content");
                Ok(())
            }
            Err(UpdaterError::NotFound) => Err(Error::NotFound {
                uuid: uuid.to_string(),
            }),
            Err(err) => Err(Error::delete_content(uuid, err)),
        }
    }
}
