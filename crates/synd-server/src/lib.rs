#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Tracing target for request handling.
pub const TRACING_TARGET_HANDLER: &str = "synd_server::handler";

mod error;
mod handler;
mod health;
mod state;

use axum::Router;
use axum::routing::{get, post};

pub use error::ApiError;
pub use health::{FULL_EXPORT_LAG_MESSAGE, HealthService};
pub use state::ServiceState;

/// Builds the service router.
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/export", post(handler::export))
        .route("/jobs", get(handler::list_jobs))
        .route("/jobs/{job_id}", get(handler::get_job))
        .route("/__health", get(handler::health))
        .route("/__gtg", get(handler::good_to_go))
        .with_state(state)
}
