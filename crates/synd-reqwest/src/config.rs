//! Endpoint configuration for the outbound HTTP clients.

use clap::Args;

use crate::{Error, Result};

/// Endpoints and credentials for the exporter's collaborators. All options
/// can be supplied as CLI flags or environment variables.
#[derive(Debug, Clone, Args)]
pub struct HttpClientConfig {
    /// Enriched-content read API; the content uuid is appended.
    #[arg(
        long = "enriched-content-api-url",
        env = "ENRICHED_CONTENT_API_URL",
        default_value = "http://localhost:8080/enrichedcontent/"
    )]
    pub enriched_content_api_url: String,

    /// Health endpoint of the enriched-content API.
    #[arg(
        long = "enriched-content-health-url",
        env = "ENRICHED_CONTENT_HEALTH_URL",
        default_value = "http://localhost:8080/__gtg"
    )]
    pub enriched_content_health_url: String,

    /// Values for the X-Policy header, e.g. INCLUDE_RICH_CONTENT,EXPAND_IMAGES.
    #[arg(long = "x-policy-header-values", env = "X_POLICY_HEADER_VALUES")]
    pub x_policy_header_values: Option<String>,

    /// Authorization header for the enriched-content API, needed only when
    /// the endpoint sits behind an edge cache.
    #[arg(long = "authorization", env = "AUTHORIZATION")]
    pub authorization: Option<String>,

    /// Object-store writer API; the content uuid is appended.
    #[arg(
        long = "store-writer-api-url",
        env = "STORE_WRITER_API_URL",
        default_value = "http://localhost:8080/content/"
    )]
    pub store_writer_api_url: String,

    /// Health endpoint of the object-store writer.
    #[arg(
        long = "store-writer-health-url",
        env = "STORE_WRITER_HEALTH_URL",
        default_value = "http://localhost:8080/__gtg"
    )]
    pub store_writer_health_url: String,

    /// Base URL of the policy evaluator.
    #[arg(
        long = "policy-agent-url",
        env = "POLICY_AGENT_URL",
        default_value = "http://localhost:8181"
    )]
    pub policy_agent_url: String,
}

impl HttpClientConfig {
    /// Validates that every configured endpoint is non-empty.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] naming the offending option.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("enriched-content-api-url", &self.enriched_content_api_url),
            ("enriched-content-health-url", &self.enriched_content_health_url),
            ("store-writer-api-url", &self.store_writer_api_url),
            ("store-writer-health-url", &self.store_writer_health_url),
            ("policy-agent-url", &self.policy_agent_url),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        http: HttpClientConfig,
    }

    #[test]
    fn defaults_validate() {
        let cli = TestCli::parse_from(["test"]);
        cli.http.validate().unwrap();
        assert!(cli.http.x_policy_header_values.is_none());
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let cli = TestCli::parse_from(["test", "--store-writer-api-url", " "]);
        let err = cli.http.validate().unwrap_err();
        assert!(err.to_string().contains("store-writer-api-url"));
    }
}
