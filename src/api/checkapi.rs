//! `GET /v1/liveness` and `GET /v1/readiness`.
//!
//! Liveness answers as long as the process can serve HTTP and reports the
//! build it is running. Readiness additionally pings the database, bounded
//! to one second, so an orchestrator can pull the instance out of rotation
//! while its store is unreachable.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::db::Database;
use crate::errs::ApiError;
use crate::mux::Config;
use crate::web::{handler, App, RouteError, Tracer};

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
    pub build: String,
    pub version: String,
    pub host: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
}

pub fn routes(app: &mut App, cfg: &Config) -> Result<(), RouteError> {
    let build: Arc<str> = Arc::from(cfg.build.as_str());
    app.handle(
        Method::GET,
        "/v1/liveness",
        handler(move |req| liveness(Arc::clone(&build), req)),
        &[],
    )?;

    let db = Arc::clone(&cfg.db);
    let tracer = cfg.tracer.clone();
    app.handle(
        Method::GET,
        "/v1/readiness",
        handler(move |_req| readiness(Arc::clone(&db), tracer.clone())),
        &[],
    )?;

    Ok(())
}

async fn liveness(build: Arc<str>, _req: Request) -> Result<Json<LivenessResponse>, ApiError> {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string());
    Ok(Json(LivenessResponse {
        status: "up".to_string(),
        build: build.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        host,
    }))
}

async fn readiness(db: Arc<dyn Database>, tracer: Tracer) -> Result<Response, ApiError> {
    let ping = db.ping().instrument(tracer.span("db.ping"));
    let failure = match tokio::time::timeout(READINESS_TIMEOUT, ping).await {
        Ok(Ok(())) => {
            return Ok(Json(ReadinessResponse {
                status: "ok".to_string(),
            })
            .into_response())
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => format!("ping timed out after {}ms", READINESS_TIMEOUT.as_millis()),
    };

    tracer
        .log()
        .emit(|| tracing::warn!(db = db.name(), error = %failure, "readiness check failed"));
    Ok((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadinessResponse {
            status: "db not ready".to_string(),
        }),
    )
        .into_response())
}
