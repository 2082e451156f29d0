//! Panic containment around the handler invocation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::Request;
use futures_util::FutureExt;

use crate::errs::ApiError;
use crate::metrics::Metrics;
use crate::web::{self, Handler, Log, Middleware};

/// The recovered fault, carried as the source of an internal failure. Only
/// ever logged.
#[derive(Debug, thiserror::Error)]
#[error("panic: {detail}")]
pub struct PanicError {
    pub detail: String,
}

/// Catches a panic raised while building the inner future or while polling
/// it and turns it into [`ApiError::Internal`]. The panic never propagates
/// further; the task serving the request carries on and writes a 500.
pub fn panics(metrics: Arc<Metrics>, log: Log) -> Middleware {
    web::from_fn(move |req: Request, next: Handler| {
        let metrics = Arc::clone(&metrics);
        let log = log.clone();
        async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();

            let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| next(req))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(payload) => Err(payload),
            };

            match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let detail = panic_message(payload.as_ref());
                    metrics.add_panic();
                    log.emit(|| {
                        tracing::error!(
                            method = %method,
                            path = %path,
                            panic = %detail,
                            "handler panicked"
                        );
                    });
                    Err(ApiError::internal(PanicError { detail }))
                }
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
