//! Logger and tracer handles carried in the capability bundle.
//!
//! [`Log`] wraps a [`tracing::Dispatch`] so middleware emits to an injected
//! subscriber instead of assuming the process-global one. [`Tracer`] creates
//! spans on that same dispatcher.

use std::sync::Arc;

use axum::http::Method;
use tracing::{Dispatch, Span};

#[derive(Clone, Debug)]
pub struct Log {
    dispatch: Dispatch,
}

impl Log {
    #[must_use]
    pub const fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// The dispatcher installed by [`logging::init`](crate::logging::init),
    /// or a no-op one when nothing was installed.
    #[must_use]
    pub fn current() -> Self {
        tracing::dispatcher::get_default(|d| Self::new(d.clone()))
    }

    /// Runs `f` with this handle's subscriber as the default, so every
    /// `tracing` event inside it goes there.
    pub fn emit<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

#[derive(Clone, Debug)]
pub struct Tracer {
    service: Arc<str>,
    log: Log,
}

impl Tracer {
    pub fn new(service: impl Into<Arc<str>>, log: Log) -> Self {
        Self {
            service: service.into(),
            log,
        }
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub const fn log(&self) -> &Log {
        &self.log
    }

    /// Root span for one request.
    #[must_use]
    pub fn request_span(&self, method: &Method, path: &str, request_id: &str) -> Span {
        self.log.emit(|| {
            tracing::info_span!(
                "request",
                service = %self.service,
                method = %method,
                path = %path,
                request_id = %request_id,
            )
        })
    }

    /// Child span for an operation inside a request (a downstream call, a
    /// database query). Parented to whatever span is current.
    #[must_use]
    pub fn span(&self, operation: &str) -> Span {
        self.log
            .emit(|| tracing::info_span!("operation", service = %self.service, op = %operation))
    }
}
