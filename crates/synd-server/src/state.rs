//! Shared request-handler state.

use std::sync::Arc;
use std::time::Duration;

use synd_core::Locker;
use synd_engine::{FullExporter, Inquirer};

use crate::HealthService;

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct ServiceState {
    pub full_exporter: Arc<FullExporter>,
    pub inquirer: Arc<dyn Inquirer>,
    pub locker: Arc<Locker>,
    pub health: Arc<HealthService>,
    /// Whether the incremental listener runs; gates the lock protocol.
    pub inc_export_enabled: bool,
    /// Per-item retrieval throttle applied by export jobs.
    pub throttle: Duration,
}
