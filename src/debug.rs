//! Operational endpoints served on the debug port, away from the public API.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::metrics::{Metrics, Snapshot};

struct DebugState {
    build: String,
    started: Instant,
    metrics: Arc<Metrics>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VarsResponse {
    pub build: String,
    pub uptime_seconds: f64,
    pub metrics: Snapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DebugLiveness {
    pub status: String,
}

/// `GET /debug/vars` and `GET /debug/liveness`.
pub fn router(build: impl Into<String>, metrics: Arc<Metrics>) -> Router {
    let state = Arc::new(DebugState {
        build: build.into(),
        started: Instant::now(),
        metrics,
    });
    Router::new()
        .route("/debug/vars", get(vars_handler))
        .route("/debug/liveness", get(liveness_handler))
        .with_state(state)
}

async fn vars_handler(State(state): State<Arc<DebugState>>) -> Json<VarsResponse> {
    Json(VarsResponse {
        build: state.build.clone(),
        uptime_seconds: state.started.elapsed().as_secs_f64(),
        metrics: state.metrics.snapshot(),
    })
}

async fn liveness_handler() -> Json<DebugLiveness> {
    Json(DebugLiveness {
        status: "up".to_string(),
    })
}
