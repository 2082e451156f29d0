//! Request start/end records.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};

use crate::web::{self, Handler, Log, Middleware};

pub fn logger(log: Log) -> Middleware {
    web::from_fn(move |req: Request, next: Handler| {
        let log = log.clone();
        async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();
            let (request_id, started) = web::context(&req).map_or_else(
                || (String::new(), Instant::now()),
                |ctx| (ctx.request_id.clone(), ctx.started),
            );
            let remote = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.to_string())
                .unwrap_or_default();

            log.emit(|| {
                tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    remote = %remote,
                    "request started"
                );
            });

            let result = next(req).await;

            let status = match &result {
                Ok(resp) => resp.status(),
                Err(err) => err.kind().status(),
            };
            let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

            log.emit(|| {
                tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    elapsed_us,
                    "request completed"
                );
            });

            result
        }
    })
}
