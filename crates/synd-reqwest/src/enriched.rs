//! Client for the enriched-content read API.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use synd_core::BoxedError;
use synd_engine::ContentFetcher;

use crate::{Error, HttpClientConfig, HttpClients, Result, TRACING_TARGET_HTTP};

/// Header carrying the transaction id to every collaborator.
pub(crate) const TRANSACTION_ID_HEADER: &str = "X-Request-Id";

/// Header selecting content policies on the read API.
const POLICY_HEADER: &str = "X-Policy";

struct FetcherInner {
    clients: HttpClients,
    api_url: String,
    health_url: String,
    x_policy_header_values: Option<String>,
    authorization: Option<String>,
}

/// Fetches the enriched payload for a content identifier.
///
/// Any non-200 response is an error; transient failures are retried with
/// the shared backoff policy.
#[derive(Clone)]
pub struct EnrichedContentFetcher {
    inner: Arc<FetcherInner>,
}

impl EnrichedContentFetcher {
    pub fn new(clients: HttpClients, config: &HttpClientConfig) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                clients,
                api_url: config.enriched_content_api_url.clone(),
                health_url: config.enriched_content_health_url.clone(),
                x_policy_header_values: config.x_policy_header_values.clone(),
                authorization: config.authorization.clone(),
            }),
        }
    }

    /// GETs `{api}/{uuid}` and returns the enriched payload bytes.
    pub async fn get_content(&self, uuid: &str, tid: &str) -> Result<Bytes> {
        let inner = &self.inner;
        let url = format!("{}{uuid}", inner.api_url);

        inner
            .clients
            .retry()
            .run(|| async {
                let mut request = inner
                    .clients
                    .api()
                    .get(&url)
                    .header(ACCEPT, "application/json")
                    .header(TRANSACTION_ID_HEADER, tid);

                if let Some(x_policy) = &inner.x_policy_header_values {
                    request = request.header(POLICY_HEADER, x_policy);
                }
                if let Some(authorization) = &inner.authorization {
                    request = request.header(AUTHORIZATION, authorization);
                }

                let response = request.send().await?;
                if response.status() != StatusCode::OK {
                    return Err(Error::unexpected_status(
                        "fetching enriched content",
                        response.status(),
                    ));
                }
                Ok(response.bytes().await?)
            })
            .await
    }

    /// Probes the read API's health endpoint.
    pub async fn check_health(&self) -> Result<String> {
        let inner = &self.inner;
        let mut request = inner.clients.health().get(&inner.health_url);
        if let Some(authorization) = &inner.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            tracing::debug!(
                target: TRACING_TARGET_HTTP,
                status = response.status().as_u16(),
                "Enriched content health probe failed"
            );
            return Err(Error::unexpected_status("GTG", response.status()));
        }
        Ok("Enriched content fetcher is good to go".to_string())
    }
}

#[async_trait]
impl ContentFetcher for EnrichedContentFetcher {
    async fn get_content(&self, uuid: &str, tid: &str) -> Result<Bytes, BoxedError> {
        EnrichedContentFetcher::get_content(self, uuid, tid)
            .await
            .map_err(BoxedError::from)
    }
}
