//! Component health reporting types.
//!
//! Each external collaborator (document store, enrichment API, store writer,
//! event stream) registers a named [`Check`]; the HTTP surface runs them and
//! renders a [`HealthReport`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use jiff::Timestamp;
use serde::Serialize;

use crate::BoxedError;

/// Future returned by a health probe: a human-readable OK message or the
/// failure cause.
pub type CheckFuture = Pin<Box<dyn Future<Output = Result<String, BoxedError>> + Send>>;

/// A health probe factory; each invocation produces a fresh probe.
pub type CheckFn = Arc<dyn Fn() -> CheckFuture + Send + Sync>;

/// A named health check against one collaborator.
#[derive(Clone)]
pub struct Check {
    /// Stable check name, e.g. `"CheckConnectivityToContentStore"`.
    pub name: &'static str,
    /// What breaks when this check fails.
    pub technical_summary: &'static str,
    /// Whether the check gates the good-to-go endpoint.
    pub gtg: bool,
    /// Lag-style checks are expected to fail while a full export saturates
    /// the pipeline; such failures are reported as messages, not outages.
    pub tolerate_during_full_export: bool,
    pub runner: CheckFn,
}

impl Check {
    pub fn new(name: &'static str, technical_summary: &'static str, runner: CheckFn) -> Self {
        Self {
            name,
            technical_summary,
            gtg: true,
            tolerate_during_full_export: false,
            runner,
        }
    }

    pub fn excluded_from_gtg(mut self) -> Self {
        self.gtg = false;
        self
    }

    pub fn tolerated_during_full_export(mut self) -> Self {
        self.tolerate_during_full_export = true;
        self
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("gtg", &self.gtg)
            .finish_non_exhaustive()
    }
}

/// Outcome of a single [`Check`] run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub ok: bool,
    pub output: String,
    pub technical_summary: &'static str,
}

/// Aggregate health of the service.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub checks: Vec<CheckResult>,
    pub checked_at: Timestamp,
}

impl HealthReport {
    pub fn new(checks: Vec<CheckResult>) -> Self {
        Self {
            healthy: checks.iter().all(|check| check.ok),
            checks,
            checked_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing(name: &'static str) -> CheckResult {
        CheckResult {
            name,
            ok: true,
            output: "OK".to_string(),
            technical_summary: "",
        }
    }

    #[test]
    fn report_is_healthy_only_when_all_checks_pass() {
        let healthy = HealthReport::new(vec![passing("a"), passing("b")]);
        assert!(healthy.healthy);

        let mut failing = passing("b");
        failing.ok = false;
        let unhealthy = HealthReport::new(vec![passing("a"), failing]);
        assert!(!unhealthy.healthy);
    }

    #[test]
    fn check_builder_flags() {
        let runner: CheckFn =
            Arc::new(|| Box::pin(async { Ok("OK".to_string()) }) as CheckFuture);
        let check = Check::new("StreamLag", "lag", runner)
            .excluded_from_gtg()
            .tolerated_during_full_export();
        assert!(!check.gtg);
        assert!(check.tolerate_during_full_export);
    }
}
