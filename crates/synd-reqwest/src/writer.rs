//! Client for the object-store writer service.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use synd_engine::{ContentUpdater, UpdaterError};

use crate::enriched::TRANSACTION_ID_HEADER;
use crate::{Error, HttpClientConfig, HttpClients, Result};

struct WriterInner {
    clients: HttpClients,
    api_url: String,
    health_url: String,
}

/// Uploads enriched payloads to, and deletes them from, the object store
/// via its HTTP writer service.
///
/// Uploads are keyed by uuid and publish date; both uploads and deletes are
/// idempotent by identifier.
#[derive(Clone)]
pub struct StoreWriter {
    inner: Arc<WriterInner>,
}

impl StoreWriter {
    pub fn new(clients: HttpClients, config: &HttpClientConfig) -> Self {
        Self {
            inner: Arc::new(WriterInner {
                clients,
                api_url: config.store_writer_api_url.clone(),
                health_url: config.store_writer_health_url.clone(),
            }),
        }
    }

    /// PUTs `{api}/{uuid}?date={date}`; 200 and 201 both mean written.
    pub async fn upload(&self, payload: Bytes, tid: &str, uuid: &str, date: &str) -> Result<()> {
        let inner = &self.inner;
        let url = format!("{}{uuid}", inner.api_url);

        inner
            .clients
            .retry()
            .run(|| async {
                let response = inner
                    .clients
                    .api()
                    .put(&url)
                    .query(&[("date", date)])
                    .header(CONTENT_TYPE, "application/json")
                    .header(TRANSACTION_ID_HEADER, tid)
                    .body(payload.clone())
                    .send()
                    .await?;

                match response.status() {
                    StatusCode::OK | StatusCode::CREATED => Ok(()),
                    status => Err(Error::unexpected_status("uploading content", status)),
                }
            })
            .await
    }

    /// DELETEs `{api}/{uuid}`; 204 means removed, 404 means it was never
    /// there.
    pub async fn delete(&self, uuid: &str, tid: &str) -> Result<()> {
        let inner = &self.inner;
        let url = format!("{}{uuid}", inner.api_url);

        inner
            .clients
            .retry()
            .run(|| async {
                let response = inner
                    .clients
                    .api()
                    .delete(&url)
                    .header(TRANSACTION_ID_HEADER, tid)
                    .send()
                    .await?;

                match response.status() {
                    StatusCode::NO_CONTENT => Ok(()),
                    StatusCode::NOT_FOUND => Err(Error::NotFound),
                    status => Err(Error::unexpected_status("deleting content", status)),
                }
            })
            .await
    }

    /// Probes the writer's health endpoint.
    pub async fn check_health(&self) -> Result<String> {
        let inner = &self.inner;
        let response = inner.clients.health().get(&inner.health_url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::unexpected_status("GTG", response.status()));
        }
        Ok("Store writer is good to go".to_string())
    }
}

#[async_trait]
impl ContentUpdater for StoreWriter {
    async fn upload(
        &self,
        payload: Bytes,
        tid: &str,
        uuid: &str,
        date: &str,
    ) -> Result<(), UpdaterError> {
        StoreWriter::upload(self, payload, tid, uuid, date)
            .await
            .map_err(|err| UpdaterError::Other(err.into()))
    }

    async fn delete(&self, uuid: &str, tid: &str) -> Result<(), UpdaterError> {
        match StoreWriter::delete(self, uuid, tid).await {
            Ok(()) => Ok(()),
            Err(Error::NotFound) => Err(UpdaterError::NotFound),
            Err(err) => Err(UpdaterError::Other(err.into())),
        }
    }
}
