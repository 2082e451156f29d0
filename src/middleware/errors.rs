//! Failure → canonical response translation.

use axum::extract::Request;
use axum::response::IntoResponse;

use crate::errs::FailureKind;
use crate::web::{self, Handler, Log, Middleware};

/// Responses the inner stages produced themselves pass through untouched;
/// only `Err` values are rewritten, so a request is never answered twice.
pub fn errors(log: Log) -> Middleware {
    web::from_fn(move |req: Request, next: Handler| {
        let log = log.clone();
        async move {
            let request_id = web::context(&req)
                .map(|ctx| ctx.request_id.clone())
                .unwrap_or_default();
            let path = req.uri().path().to_owned();

            let err = match next(req).await {
                Ok(resp) => return Ok(resp),
                Err(err) => err,
            };

            let kind = err.kind();
            log.emit(|| {
                if kind == FailureKind::Internal {
                    tracing::error!(
                        request_id = %request_id,
                        path = %path,
                        status = kind.status().as_u16(),
                        error = %err,
                        "request failed"
                    );
                } else {
                    tracing::warn!(
                        request_id = %request_id,
                        path = %path,
                        status = kind.status().as_u16(),
                        error = %err,
                        "request failed"
                    );
                }
            });

            Ok(err.into_response())
        }
    })
}
