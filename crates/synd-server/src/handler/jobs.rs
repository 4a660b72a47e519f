//! Job query endpoints.

use axum::Json;
use axum::extract::{Path, State};
use synd_engine::JobSnapshot;

use crate::{ApiError, ServiceState, TRACING_TARGET_HANDLER};

/// `GET /jobs/{job_id}` — one job snapshot.
pub(crate) async fn get_job(
    State(state): State<ServiceState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    match state.full_exporter.get_job(&job_id) {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                job_id,
                error = %err,
                "Failed to retrieve job"
            );
            Err(ApiError::not_found("Job not found"))
        }
    }
}

/// `GET /jobs` — snapshots of every running job.
pub(crate) async fn list_jobs(State(state): State<ServiceState>) -> Json<Vec<JobSnapshot>> {
    Json(state.full_exporter.get_running_jobs())
}
