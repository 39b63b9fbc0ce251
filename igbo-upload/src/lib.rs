//! igbo-upload library interface
//!
//! Exposes the workflow, stores and router for the binary and for
//! integration tests.

pub mod api;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod store;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::workflow::SubmissionWorkflow;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<SubmissionWorkflow>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last failed submission, reported by /health
    pub last_error: Arc<RwLock<Option<String>>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(workflow: SubmissionWorkflow, max_upload_bytes: usize) -> Self {
        Self {
            workflow: Arc::new(workflow),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
            max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::submission_routes(state.max_upload_bytes))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
