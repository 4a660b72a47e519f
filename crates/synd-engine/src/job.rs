//! Export jobs: locked progress state and the bounded worker pool.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use synd_core::Stub;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::TRACING_TARGET_JOB;

/// Lifecycle of an export job. Transitions only ever move forward:
/// `Starting → Running → Finished`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    #[default]
    Starting,
    Running,
    Finished,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Starting => write!(f, "Starting"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Finished => write!(f, "Finished"),
        }
    }
}

/// A running or completed export.
///
/// Cheap to clone; all mutable state lives behind one lock and is only
/// observable through [`snapshot`](Self::snapshot), so callers never see a
/// partially updated job.
#[derive(Debug, Clone)]
pub struct Job {
    inner: Arc<JobInner>,
}

#[derive(Debug)]
struct JobInner {
    id: String,
    worker_count: usize,
    throttle: Duration,
    is_full_export: bool,
    state: RwLock<JobState>,
}

#[derive(Debug, Default)]
struct JobState {
    status: JobStatus,
    count: usize,
    progress: usize,
    failed: Vec<String>,
    error_message: Option<String>,
}

/// Consistent point-in-time copy of a job, serialized with the wire field
/// names the HTTP surface exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Count", skip_serializing_if = "is_zero")]
    pub count: usize,
    #[serde(rename = "Progress", skip_serializing_if = "is_zero")]
    pub progress: usize,
    #[serde(rename = "Failed", skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
    #[serde(rename = "Status")]
    pub status: JobStatus,
    #[serde(rename = "ErrorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &usize) -> bool {
    *value == 0
}

impl Job {
    pub fn new(worker_count: usize, throttle: Duration, is_full_export: bool) -> Self {
        Self {
            inner: Arc::new(JobInner {
                id: Uuid::new_v4().to_string(),
                worker_count,
                throttle,
                is_full_export,
                state: RwLock::new(JobState::default()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn is_full_export(&self) -> bool {
        self.inner.is_full_export
    }

    pub fn status(&self) -> JobStatus {
        self.read_state().status
    }

    /// Records the total number of stubs the inquirer will produce.
    pub fn set_count(&self, count: usize) {
        self.write_state().count = count;
    }

    /// Terminates the job on an inquirer-level failure; per-item errors go
    /// through [`record_failure`](Self::record_failure) instead.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.write_state();
        state.error_message = Some(message.into());
        state.status = JobStatus::Finished;
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.read_state();
        JobSnapshot {
            id: self.inner.id.clone(),
            count: state.count,
            progress: state.progress,
            failed: state.failed.clone(),
            status: state.status,
            error_message: state.error_message.clone(),
        }
    }

    /// Drains `stubs` through a pool of `worker_count` workers, calling
    /// `export` once per stub, and blocks until every worker has finished.
    ///
    /// Stubs are dispatched in arrival order; completion order is not
    /// preserved. A failed item records its uuid and never affects sibling
    /// items. The per-item throttle sleeps inside the worker, before the
    /// export call, so the effective rate is `worker_count / throttle`.
    pub async fn run_export<F, Fut>(&self, tid: &str, mut stubs: mpsc::Receiver<Stub>, export: F)
    where
        F: Fn(String, Stub) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<()>> + Send + 'static,
    {
        tracing::info!(target: TRACING_TARGET_JOB, job_id = %self.inner.id, "Job started");
        self.set_status(JobStatus::Running);

        let workers = Arc::new(Semaphore::new(self.inner.worker_count));
        let mut tasks = JoinSet::new();

        while let Some(stub) = stubs.recv().await {
            // Blocks until a worker slot frees up; this is the back-pressure
            // that keeps at most `worker_count` exports in flight.
            let Ok(permit) = Arc::clone(&workers).acquire_owned().await else {
                break;
            };

            self.write_state().progress += 1;

            let job = self.clone();
            let tid = tid.to_string();
            let export = export.clone();
            let throttle = self.inner.throttle;
            tasks.spawn(async move {
                let _permit = permit;
                if !throttle.is_zero() {
                    tokio::time::sleep(throttle).await;
                }
                if let Err(err) = export(tid.clone(), stub.clone()).await {
                    tracing::error!(
                        target: TRACING_TARGET_JOB,
                        tid = %tid,
                        uuid = %stub.uuid,
                        error = %err,
                        "Failed to process document"
                    );
                    job.record_failure(stub.uuid);
                }
            });

            // Reap already-completed workers so the task set stays small.
            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
        self.set_status(JobStatus::Finished);

        let snapshot = self.snapshot();
        tracing::info!(
            target: TRACING_TARGET_JOB,
            job_id = %self.inner.id,
            failures = snapshot.failed.len(),
            progress = snapshot.progress,
            "Finished job"
        );
    }

    fn record_failure(&self, uuid: String) {
        self.write_state().failed.push(uuid);
    }

    fn set_status(&self, status: JobStatus) {
        self.write_state().status = status;
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, JobState> {
        self.inner.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, JobState> {
        self.inner.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-memory job registry. Jobs are process-local and kept until restart.
pub(crate) type JobMap = RwLock<HashMap<String, Job>>;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::STUB_STREAM_CAPACITY;

    fn stub(uuid: &str) -> Stub {
        Stub {
            uuid: uuid.to_string(),
            date: "2024-01-17".to_string(),
            content_type: "Article".to_string(),
            ..Stub::default()
        }
    }

    #[tokio::test]
    async fn run_export_drains_all_stubs_and_finishes() {
        let job = Job::new(4, Duration::ZERO, false);
        job.set_count(3);
        let (tx, rx) = mpsc::channel(STUB_STREAM_CAPACITY);

        let exported = Arc::new(AtomicUsize::new(0));
        let counter = exported.clone();

        for id in ["a", "b", "c"] {
            tx.send(stub(id)).await.unwrap();
        }
        drop(tx);

        job.run_export("tid_1", rx, move |_tid, _stub| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        let snapshot = job.snapshot();
        assert_eq!(exported.load(Ordering::SeqCst), 3);
        assert_eq!(snapshot.status, JobStatus::Finished);
        assert_eq!(snapshot.progress, 3);
        assert_eq!(snapshot.count, 3);
        assert!(snapshot.failed.is_empty());
    }

    #[tokio::test]
    async fn run_export_records_failures_without_aborting_siblings() {
        let job = Job::new(2, Duration::ZERO, false);
        let (tx, rx) = mpsc::channel(STUB_STREAM_CAPACITY);

        for id in ["good-1", "bad", "good-2"] {
            tx.send(stub(id)).await.unwrap();
        }
        drop(tx);

        job.run_export("tid_1", rx, |_tid, stub| async move {
            if stub.uuid == "bad" {
                Err(crate::Error::get_content(&stub.uuid, "boom".to_string()))
            } else {
                Ok(())
            }
        })
        .await;

        let snapshot = job.snapshot();
        assert_eq!(snapshot.progress, 3);
        assert_eq!(snapshot.failed, vec!["bad".to_string()]);
        assert_eq!(snapshot.status, JobStatus::Finished);
    }

    #[tokio::test]
    async fn run_export_never_exceeds_worker_count() {
        let workers = 3;
        let job = Job::new(workers, Duration::ZERO, false);
        let (tx, rx) = mpsc::channel(STUB_STREAM_CAPACITY);

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let producer = tokio::spawn(async move {
            for i in 0..20 {
                tx.send(stub(&format!("doc-{i}"))).await.unwrap();
            }
        });

        let (in_flight_w, peak_w) = (in_flight.clone(), peak.clone());
        job.run_export("tid_1", rx, move |_tid, _stub| {
            let in_flight = in_flight_w.clone();
            let peak = peak_w.clone();
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        producer.await.unwrap();
        assert!(peak.load(Ordering::SeqCst) <= workers);
        assert_eq!(job.snapshot().progress, 20);
    }

    #[tokio::test]
    async fn failed_job_keeps_error_message() {
        let job = Job::new(1, Duration::ZERO, true);
        job.fail("Failed to read content from store");

        let snapshot = job.snapshot();
        assert_eq!(snapshot.status, JobStatus::Finished);
        assert_eq!(
            snapshot.error_message.as_deref(),
            Some("Failed to read content from store")
        );
    }

    #[test]
    fn snapshot_serializes_with_wire_field_names() {
        let job = Job::new(1, Duration::ZERO, true);
        let value = serde_json::to_value(job.snapshot()).unwrap();

        assert_eq!(value["Status"], "Starting");
        assert!(value.get("ID").is_some());
        // Zero counters and empty collections are omitted.
        assert!(value.get("Count").is_none());
        assert!(value.get("Progress").is_none());
        assert!(value.get("Failed").is_none());
        assert!(value.get("ErrorMessage").is_none());
    }
}
