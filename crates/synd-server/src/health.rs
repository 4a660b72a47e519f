//! Aggregated collaborator health checks.

use std::sync::Arc;

use futures::future::join_all;
use synd_core::health::{Check, CheckResult, HealthReport};
use synd_engine::FullExporter;

/// Message prefixed to tolerated check failures while a full export runs.
pub const FULL_EXPORT_LAG_MESSAGE: &str =
    "Service is currently performing a full export and lag is expected";

/// Runs the registered collaborator checks for the health endpoints.
pub struct HealthService {
    checks: Vec<Check>,
    status_manager: Arc<FullExporter>,
}

impl HealthService {
    pub fn new(checks: Vec<Check>, status_manager: Arc<FullExporter>) -> Self {
        Self {
            checks,
            status_manager,
        }
    }

    /// Runs every check and renders the full report.
    ///
    /// A failing check marked as tolerated is downgraded to a healthy
    /// result with an explanatory message while a full export is running;
    /// stream lag is expected when the pipeline is saturated.
    pub async fn health(&self) -> HealthReport {
        let outcomes = join_all(self.checks.iter().map(|check| async move {
            let outcome = (check.runner)().await;
            (check, outcome)
        }))
        .await;

        let full_export_running = self.status_manager.is_full_export_running();
        let results = outcomes
            .into_iter()
            .map(|(check, outcome)| match outcome {
                Ok(output) => CheckResult {
                    name: check.name,
                    ok: true,
                    output,
                    technical_summary: check.technical_summary,
                },
                Err(err) if check.tolerate_during_full_export && full_export_running => {
                    CheckResult {
                        name: check.name,
                        ok: true,
                        output: format!("{FULL_EXPORT_LAG_MESSAGE}: {err}"),
                        technical_summary: check.technical_summary,
                    }
                }
                Err(err) => CheckResult {
                    name: check.name,
                    ok: false,
                    output: err.to_string(),
                    technical_summary: check.technical_summary,
                },
            })
            .collect();

        HealthReport::new(results)
    }

    /// Fails fast across the gtg-gating checks.
    pub async fn good_to_go(&self) -> Result<(), String> {
        let gating = self.checks.iter().filter(|check| check.gtg);
        let outcomes = join_all(gating.map(|check| async {
            let outcome = (check.runner)().await;
            (check.name, outcome)
        }))
        .await;

        for (name, outcome) in outcomes {
            if let Err(err) = outcome {
                return Err(format!("{name}: {err}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use synd_core::health::{CheckFn, CheckFuture};
    use synd_engine::Exporter;

    use super::*;

    mod support {
        use async_trait::async_trait;
        use bytes::Bytes;
        use synd_core::BoxedError;
        use synd_engine::{ContentFetcher, ContentUpdater, UpdaterError};

        pub struct Noop;

        #[async_trait]
        impl ContentFetcher for Noop {
            async fn get_content(&self, _uuid: &str, _tid: &str) -> Result<Bytes, BoxedError> {
                Ok(Bytes::new())
            }
        }

        #[async_trait]
        impl ContentUpdater for Noop {
            async fn upload(
                &self,
                _payload: Bytes,
                _tid: &str,
                _uuid: &str,
                _date: &str,
            ) -> Result<(), UpdaterError> {
                Ok(())
            }

            async fn delete(&self, _uuid: &str, _tid: &str) -> Result<(), UpdaterError> {
                Ok(())
            }
        }
    }

    fn registry() -> Arc<FullExporter> {
        let exporter = Exporter::new(Arc::new(support::Noop), Arc::new(support::Noop));
        Arc::new(FullExporter::new(4, Arc::new(exporter)))
    }

    fn passing() -> CheckFn {
        Arc::new(|| Box::pin(async { Ok("OK".to_string()) }) as CheckFuture)
    }

    fn failing(message: &'static str) -> CheckFn {
        Arc::new(move || Box::pin(async move { Err(message.to_string().into()) }) as CheckFuture)
    }

    #[tokio::test]
    async fn healthy_when_all_checks_pass() {
        let service = HealthService::new(
            vec![
                Check::new("A", "a down", passing()),
                Check::new("B", "b down", passing()),
            ],
            registry(),
        );

        let report = service.health().await;
        assert!(report.healthy);
        assert_eq!(report.checks.len(), 2);
        assert!(service.good_to_go().await.is_ok());
    }

    #[tokio::test]
    async fn failing_check_is_reported_and_blocks_gtg() {
        let service = HealthService::new(
            vec![
                Check::new("A", "a down", passing()),
                Check::new("B", "b down", failing("connection refused")),
            ],
            registry(),
        );

        let report = service.health().await;
        assert!(!report.healthy);
        let failed = report.checks.iter().find(|c| c.name == "B").unwrap();
        assert!(failed.output.contains("connection refused"));

        let gtg = service.good_to_go().await.unwrap_err();
        assert!(gtg.contains("B"));
    }

    #[tokio::test]
    async fn lag_is_tolerated_during_a_full_export() {
        let registry = registry();
        let job = registry.new_job(Duration::ZERO, true);
        registry.add_job(job);

        let service = HealthService::new(
            vec![
                Check::new("StreamLag", "consumer lagging", failing("lagging"))
                    .excluded_from_gtg()
                    .tolerated_during_full_export(),
            ],
            registry,
        );

        let report = service.health().await;
        assert!(report.healthy);
        assert!(report.checks[0].output.starts_with(FULL_EXPORT_LAG_MESSAGE));
        // Excluded from gtg entirely.
        assert!(service.good_to_go().await.is_ok());
    }

    #[tokio::test]
    async fn lag_fails_the_report_outside_full_exports() {
        let service = HealthService::new(
            vec![
                Check::new("StreamLag", "consumer lagging", failing("lagging"))
                    .excluded_from_gtg()
                    .tolerated_during_full_export(),
            ],
            registry(),
        );

        let report = service.health().await;
        assert!(!report.healthy);
    }
}
