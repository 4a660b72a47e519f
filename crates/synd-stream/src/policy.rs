//! Seam to the content-policy evaluator.

use async_trait::async_trait;
use serde::Deserialize;
use synd_core::BoxedError;

/// Decision returned by the policy evaluator for one event.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContentPolicyResult {
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Evaluates whether an event's content is restricted from export.
#[async_trait]
pub trait PolicyAgent: Send + Sync {
    async fn evaluate_content_policy(
        &self,
        query: serde_json::Value,
    ) -> Result<ContentPolicyResult, BoxedError>;
}
