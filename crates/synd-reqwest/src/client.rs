//! Shared HTTP clients with per-host connection pool caps.

use std::time::Duration;

use reqwest::Client;

use crate::{Result, RetryPolicy, TRACING_TARGET_HTTP, USER_AGENT};

/// Data-path request timeout.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle connections kept per host on the data path.
const API_POOL_MAX_IDLE_PER_HOST: usize = 128;

/// Health-probe request timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Idle connections kept per host for health probes.
const HEALTH_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// The two shared HTTP clients every collaborator uses: a pooled, retrying
/// data-path client and a short-timeout health client.
///
/// Cloning is cheap; `reqwest::Client` is an `Arc` internally and the
/// connection pools are shared across clones.
#[derive(Debug, Clone)]
pub struct HttpClients {
    api: Client,
    health: Client,
    retry: RetryPolicy,
}

impl HttpClients {
    pub fn new() -> Result<Self> {
        let api = Client::builder()
            .timeout(API_TIMEOUT)
            .pool_max_idle_per_host(API_POOL_MAX_IDLE_PER_HOST)
            .user_agent(USER_AGENT)
            .build()?;

        let health = Client::builder()
            .timeout(HEALTH_TIMEOUT)
            .pool_max_idle_per_host(HEALTH_POOL_MAX_IDLE_PER_HOST)
            .user_agent(USER_AGENT)
            .build()?;

        tracing::debug!(
            target: TRACING_TARGET_HTTP,
            api_timeout_secs = API_TIMEOUT.as_secs(),
            health_timeout_secs = HEALTH_TIMEOUT.as_secs(),
            "HTTP clients created"
        );

        Ok(Self {
            api,
            health,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api(&self) -> &Client {
        &self.api
    }

    pub fn health(&self) -> &Client {
        &self.health
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}
