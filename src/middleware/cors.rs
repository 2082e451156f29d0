//! Cross-origin resource sharing, backed by [`tower_http::cors::CorsLayer`].
//!
//! The layer is adapted into a pipeline [`Middleware`] so `App` can place it
//! in front of the global chain. Request classes:
//!
//! | Request | Origin allowed | Origin not allowed |
//! |---|---|---|
//! | Preflight (`OPTIONS` + `Origin` + `Access-Control-Request-Method`) | `200` with CORS headers, chain skipped | `403`, no CORS headers, chain skipped |
//! | Other `OPTIONS` | passed on untouched | passed on untouched |
//! | Anything else | passed on, response gets `Access-Control-Allow-Origin` | passed on, no allow header |

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::header::{
    ACCEPT, ACCEPT_ENCODING, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD,
    AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN,
};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use tower::{service_fn, Layer, ServiceExt};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::web::{BoxFuture, Handler, HandlerResult, Middleware};

pub const ALLOW_METHODS: [Method; 6] = [
    Method::POST,
    Method::PATCH,
    Method::GET,
    Method::OPTIONS,
    Method::PUT,
    Method::DELETE,
];

pub const ALLOW_HEADERS: [HeaderName; 6] = [
    ACCEPT,
    CONTENT_TYPE,
    CONTENT_LENGTH,
    ACCEPT_ENCODING,
    HeaderName::from_static("x-csrf-token"),
    AUTHORIZATION,
];

pub const MAX_AGE: Duration = Duration::from_secs(86_400);

const WILDCARD: &str = "*";

/// The layer for an origin list. A `*` entry allows every origin; entries
/// that are not valid header values are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == WILDCARD) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(ALLOW_METHODS)
        .allow_headers(ALLOW_HEADERS)
        .max_age(MAX_AGE)
}

pub fn cors(origins: &[String]) -> Middleware {
    let layer = cors_layer(origins);
    Arc::new(move |next: Handler| -> Handler {
        let inner = Arc::clone(&next);
        let svc = layer.layer(service_fn(move |req: Request| {
            let inner = Arc::clone(&inner);
            async move {
                Ok::<_, Infallible>(inner(req).await.unwrap_or_else(IntoResponse::into_response))
            }
        }));

        Arc::new(move |req: Request| -> BoxFuture<HandlerResult> {
            let next = Arc::clone(&next);
            let svc = svc.clone();
            Box::pin(async move {
                let options = req.method() == Method::OPTIONS;
                let preflight = options
                    && req.headers().contains_key(ORIGIN)
                    && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);

                // The layer answers every OPTIONS itself.
                if options && !preflight {
                    return next(req).await;
                }

                let resp = svc.oneshot(req).await.unwrap_or_else(|never| match never {});
                if preflight && !resp.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
                    return Ok(StatusCode::FORBIDDEN.into_response());
                }
                Ok(resp)
            })
        })
    })
}
