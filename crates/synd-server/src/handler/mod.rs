//! Request handlers for the export service.

mod export;
mod health;
mod jobs;

pub(crate) use export::export;
pub(crate) use health::{good_to_go, health};
pub(crate) use jobs::{get_job, list_jobs};

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the transaction id end to end.
pub(crate) const TRANSACTION_ID_HEADER: &str = "X-Request-Id";

/// Reads the transaction id from the request, generating one when absent.
pub(crate) fn transaction_id(headers: &HeaderMap) -> String {
    headers
        .get(TRANSACTION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let random = Uuid::new_v4().simple().to_string();
            format!("tid_{}", &random[..10])
        })
}
