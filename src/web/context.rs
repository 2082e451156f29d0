//! Per-request state created at chain entry.

use std::time::{Duration, Instant};

use axum::extract::Request;
use tracing::Span;

use super::trace::Tracer;

/// Header a caller (or an upstream proxy) may set to pin the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Lives in the request extensions for the duration of one request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub started: Instant,
    pub span: Span,
}

impl RequestContext {
    #[must_use]
    pub fn new(tracer: &Tracer, req: &Request) -> Self {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);
        let span = tracer.request_span(req.method(), req.uri().path(), &request_id);

        Self {
            request_id,
            started: Instant::now(),
            span,
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[must_use]
pub fn context(req: &Request) -> Option<&RequestContext> {
    req.extensions().get::<RequestContext>()
}
