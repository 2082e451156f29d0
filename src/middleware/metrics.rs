//! Request counters sampled around the inner chain. The in-flight gauge is
//! released even when the inner chain unwinds.

use std::sync::Arc;

use axum::extract::Request;

use crate::metrics::Metrics;
use crate::web::{self, Handler, Middleware};

/// Counts requests, failures and status classes. Never changes the result.
pub fn metrics(metrics: Arc<Metrics>) -> Middleware {
    web::from_fn(move |req: Request, next: Handler| {
        let metrics = Arc::clone(&metrics);
        async move {
            let _in_flight = metrics.start_request();
            let result = next(req).await;

            match &result {
                Ok(resp) => metrics.record_status(resp.status()),
                Err(err) => {
                    metrics.add_error();
                    metrics.record_status(err.kind().status());
                }
            }

            result
        }
    })
}
