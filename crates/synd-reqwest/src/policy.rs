//! Client for the content-policy evaluator.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use synd_core::BoxedError;
use synd_stream::{ContentPolicyResult, PolicyAgent};

use crate::{Error, HttpClientConfig, HttpClients, Result, TRACING_TARGET_HTTP};

/// Policy package evaluated for every publication event.
const CONTENT_POLICY_PATH: &str = "content_msg_evaluator";

#[derive(Debug, Deserialize)]
struct PolicyResponse {
    #[serde(default)]
    decision_id: Option<String>,
    #[serde(default)]
    result: Option<ContentPolicyResult>,
}

struct AgentInner {
    clients: HttpClients,
    query_url: String,
}

/// Queries the policy evaluator's data API.
///
/// An absent `result` means the policy holds no opinion; that is treated as
/// "do not skip".
#[derive(Clone)]
pub struct PolicyAgentClient {
    inner: Arc<AgentInner>,
}

impl PolicyAgentClient {
    pub fn new(clients: HttpClients, config: &HttpClientConfig) -> Self {
        let base = config.policy_agent_url.trim_end_matches('/');
        Self {
            inner: Arc::new(AgentInner {
                clients,
                query_url: format!("{base}/v1/data/{CONTENT_POLICY_PATH}"),
            }),
        }
    }

    pub async fn evaluate_content_policy(
        &self,
        query: serde_json::Value,
    ) -> Result<ContentPolicyResult> {
        let inner = &self.inner;
        let response = inner
            .clients
            .api()
            .post(&inner.query_url)
            .json(&serde_json::json!({ "input": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::unexpected_status(
                "evaluating content policy",
                response.status(),
            ));
        }

        let decision: PolicyResponse = response.json().await?;
        tracing::debug!(
            target: TRACING_TARGET_HTTP,
            decision_id = decision.decision_id.as_deref().unwrap_or_default(),
            "Evaluated content policy"
        );

        Ok(decision.result.unwrap_or_default())
    }
}

#[async_trait]
impl PolicyAgent for PolicyAgentClient {
    async fn evaluate_content_policy(
        &self,
        query: serde_json::Value,
    ) -> Result<ContentPolicyResult, BoxedError> {
        PolicyAgentClient::evaluate_content_policy(self, query)
            .await
            .map_err(BoxedError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::extract::Json;
    use axum::routing::post;
    use serde_json::{Value, json};

    use super::*;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn agent_for(addr: SocketAddr) -> PolicyAgentClient {
        let config = HttpClientConfig {
            enriched_content_api_url: String::new(),
            enriched_content_health_url: String::new(),
            x_policy_header_values: None,
            authorization: None,
            store_writer_api_url: String::new(),
            store_writer_health_url: String::new(),
            policy_agent_url: format!("http://{addr}"),
        };
        PolicyAgentClient::new(HttpClients::new().unwrap(), &config)
    }

    #[tokio::test]
    async fn decodes_skip_decisions() {
        let router = Router::new().route(
            "/v1/data/content_msg_evaluator",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["input"]["payload"]["publication"], json!(["p1"]));
                Json(json!({
                    "decision_id": "d-1",
                    "result": {"skip": true, "reasons": ["restricted publication"]},
                }))
            }),
        );
        let addr = serve(router).await;

        let decision = agent_for(addr)
            .evaluate_content_policy(json!({"payload": {"publication": ["p1"]}}))
            .await
            .unwrap();
        assert!(decision.skip);
        assert_eq!(decision.reasons, vec!["restricted publication".to_string()]);
    }

    #[tokio::test]
    async fn missing_result_means_no_skip() {
        let router = Router::new().route(
            "/v1/data/content_msg_evaluator",
            post(|| async { Json(json!({})) }),
        );
        let addr = serve(router).await;

        let decision = agent_for(addr)
            .evaluate_content_policy(json!({}))
            .await
            .unwrap();
        assert!(!decision.skip);
        assert!(decision.reasons.is_empty());
    }

    #[tokio::test]
    async fn unreachable_evaluator_is_an_error() {
        let config = HttpClientConfig {
            enriched_content_api_url: String::new(),
            enriched_content_health_url: String::new(),
            x_policy_header_values: None,
            authorization: None,
            store_writer_api_url: String::new(),
            store_writer_health_url: String::new(),
            // Reserved port with nothing listening.
            policy_agent_url: "http://127.0.0.1:9".to_string(),
        };
        let agent = PolicyAgentClient::new(HttpClients::new().unwrap(), &config);
        assert!(agent.evaluate_content_policy(json!({})).await.is_err());
    }
}
