//! Export trigger endpoint.

use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use synd_engine::{Job, JobStatus};

use super::transaction_id;
use crate::{ApiError, ServiceState, TRACING_TARGET_HANDLER};

/// Inquirer budget for a targeted export.
const TARGETED_EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Inquirer budget for a full collection scan.
const FULL_EXPORT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(rename = "fullExport")]
    full_export: Option<bool>,
}

/// Optional request body: an explicit comma-separated identifier list.
#[derive(Debug, Deserialize)]
struct ExportRequest {
    ids: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewJobResponse {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Status")]
    status: JobStatus,
}

/// `POST /export?fullExport={bool}` with optional `{"ids":"a,b"}` body.
///
/// Refuses while any job is running, demands exactly one of the identifier
/// list and the full-export flag, and, when incremental export is enabled,
/// pauses the listener through the lock protocol before the job starts
/// reading the store. The export itself runs in the background; the reply
/// is the freshly registered job.
pub(crate) async fn export(
    State(state): State<ServiceState>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<NewJobResponse>), ApiError> {
    if !state.full_exporter.get_running_jobs().is_empty() {
        return Err(ApiError::bad_request(
            "There are already running export jobs. Please wait them to finish",
        ));
    }

    let is_full_export = query.full_export.unwrap_or(false);
    let candidates = parse_candidate_ids(&body);

    match &candidates {
        Err(err) if !is_full_export => {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                error = %err,
                "Can't trigger a non-full export without ids"
            );
            return Err(ApiError::bad_request(
                "Pass a list of ids or trigger a full export flag",
            ));
        }
        Ok(_) if is_full_export => {
            tracing::warn!(target: TRACING_TARGET_HANDLER, "Can't trigger a full export with ids");
            return Err(ApiError::bad_request(
                "Pass either a list of ids or the full export flag, not both",
            ));
        }
        _ => {}
    }
    let candidates = candidates.unwrap_or_default();

    if state.inc_export_enabled {
        state
            .locker
            .lock()
            .await
            .map_err(|err| ApiError::service_unavailable(err.to_string()))?;
    }

    let tid = transaction_id(&headers);
    let job = state.full_exporter.new_job(state.throttle, is_full_export);
    state.full_exporter.add_job(job.clone());

    let response = NewJobResponse {
        id: job.id().to_string(),
        status: job.status(),
    };

    tokio::spawn(start_export(state, job, is_full_export, candidates, tid));

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Runs one export job to completion and releases the listener lock.
async fn start_export(
    state: ServiceState,
    job: Job,
    is_full_export: bool,
    candidates: Vec<String>,
    tid: String,
) {
    let timeout = if is_full_export {
        FULL_EXPORT_TIMEOUT
    } else {
        TARGETED_EXPORT_TIMEOUT
    };

    tracing::info!(target: TRACING_TARGET_HANDLER, tid, "Calling the document store");
    match state.inquirer.inquire(timeout, candidates).await {
        Ok(inquiry) => {
            tracing::info!(
                target: TRACING_TARGET_HANDLER,
                tid,
                count = inquiry.count,
                "Number of UUIDs found"
            );
            job.set_count(inquiry.count);

            let exporter = state.full_exporter.exporter();
            job.run_export(&tid, inquiry.stubs, move |tid, stub| {
                let exporter = exporter.clone();
                async move { exporter.export(&tid, &stub).await }
            })
            .await;
        }
        Err(err) => {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                tid,
                error = %err,
                "Failed to read content from store"
            );
            job.fail("Failed to read content from store");
        }
    }

    if state.inc_export_enabled {
        tracing::info!(target: TRACING_TARGET_HANDLER, tid, "Locker released");
        state.locker.unlock().await;
    }
}

/// Extracts the candidate identifier list from the request body.
fn parse_candidate_ids(body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let request: ExportRequest = serde_json::from_slice(body)?;
    Ok(request.ids.split(',').map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_separated_ids() {
        let ids = parse_candidate_ids(br#"{"ids":"a,b,c"}"#).unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn empty_body_has_no_ids() {
        assert!(parse_candidate_ids(b"").is_err());
    }

    #[test]
    fn missing_or_mistyped_ids_field_is_an_error() {
        assert!(parse_candidate_ids(br#"{}"#).is_err());
        assert!(parse_candidate_ids(br#"{"ids": 42}"#).is_err());
    }
}
