//! Registry of export jobs and the shared per-item exporter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::job::JobMap;
use crate::{Error, Exporter, Job, JobSnapshot, JobStatus, Result};

/// Owns the job registry and the exporter every job runs through.
///
/// Jobs are process-local: the registry grows until restart and is never
/// garbage collected. A single reader/writer lock guards the map; all reads
/// hand out snapshots.
pub struct FullExporter {
    jobs: JobMap,
    worker_count: usize,
    exporter: Arc<Exporter>,
}

impl FullExporter {
    pub fn new(worker_count: usize, exporter: Arc<Exporter>) -> Self {
        Self {
            jobs: JobMap::new(HashMap::new()),
            worker_count,
            exporter,
        }
    }

    /// Creates a job sized to this registry's worker pool. The job is not
    /// registered until [`add_job`](Self::add_job).
    pub fn new_job(&self, throttle: Duration, is_full_export: bool) -> Job {
        Job::new(self.worker_count, throttle, is_full_export)
    }

    pub fn add_job(&self, job: Job) {
        self.write_jobs().insert(job.id().to_string(), job);
    }

    /// # Errors
    ///
    /// [`Error::JobNotFound`] when no job is registered under `job_id`.
    pub fn get_job(&self, job_id: &str) -> Result<JobSnapshot> {
        self.read_jobs()
            .get(job_id)
            .map(Job::snapshot)
            .ok_or(Error::JobNotFound)
    }

    pub fn get_running_jobs(&self) -> Vec<JobSnapshot> {
        self.read_jobs()
            .values()
            .filter(|job| job.status() == JobStatus::Running)
            .map(Job::snapshot)
            .collect()
    }

    /// Whether a full export exists that has not yet finished.
    pub fn is_full_export_running(&self) -> bool {
        self.read_jobs()
            .values()
            .any(|job| job.is_full_export() && job.status() != JobStatus::Finished)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn exporter(&self) -> Arc<Exporter> {
        Arc::clone(&self.exporter)
    }

    fn read_jobs(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Job>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_jobs(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Job>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }
}
