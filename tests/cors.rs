//! CORS stage placement and header handling.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, VARY,
};
use axum::http::{HeaderMap, HeaderName, Method, Request, StatusCode};
use axum::Router;
use webmux::errs::ApiError;
use webmux::middleware::{ALLOW_HEADERS, ALLOW_METHODS, MAX_AGE};
use webmux::mux::{self, Config, Options};
use webmux::web::{handler, App, RouteError};

use common::{harness, send, Harness};

const APP_ORIGIN: &str = "https://app.example.com";

fn build(h: &Harness, origins: &[&str], hits: &Arc<AtomicUsize>) -> Router {
    let counter = Arc::clone(hits);
    let routes = move |app: &mut App, _cfg: &Config| -> Result<(), RouteError> {
        let counter = Arc::clone(&counter);
        app.handle(
            Method::POST,
            "/v1/homes",
            handler(move |_req| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ApiError>(StatusCode::CREATED) }
            }),
            &[],
        )
    };
    mux::web_api(
        &h.cfg,
        &routes,
        Options::default().with_cors(origins.iter().copied()),
    )
    .unwrap()
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/v1/homes")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap()
}

/// Lower-cased values of a comma-separated header, across every occurrence.
fn list(headers: &HeaderMap, name: HeaderName) -> Vec<String> {
    let mut values: Vec<String> = headers
        .get_all(name)
        .iter()
        .flat_map(|v| v.to_str().unwrap().split(','))
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    values.sort();
    values
}

fn sorted<T: ToString>(items: &[T]) -> Vec<String> {
    let mut values: Vec<String> = items
        .iter()
        .map(|i| i.to_string().to_ascii_lowercase())
        .collect();
    values.sort();
    values
}

fn post(origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/v1/homes");
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn allowed_preflight_short_circuits() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &[APP_ORIGIN], &hits);

    let reply = send(&router, preflight(APP_ORIGIN)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
    assert_eq!(
        list(&reply.headers, ACCESS_CONTROL_ALLOW_METHODS),
        sorted(&ALLOW_METHODS)
    );
    assert_eq!(
        list(&reply.headers, ACCESS_CONTROL_ALLOW_HEADERS),
        sorted(&ALLOW_HEADERS)
    );
    assert_eq!(
        reply.headers[ACCESS_CONTROL_MAX_AGE],
        MAX_AGE.as_secs().to_string()
    );
    assert!(reply.body.is_empty());

    // Neither the handler nor the global chain saw it.
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(h.logs.find("request started").is_empty());
    assert_eq!(h.metrics.snapshot().requests, 0);
}

#[tokio::test]
async fn preflight_from_unlisted_origin_is_refused() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &[APP_ORIGIN], &hits);

    let reply = send(&router, preflight("https://evil.example")).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(reply.headers.get(ACCESS_CONTROL_ALLOW_METHODS).is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn simple_request_is_decorated_and_forwarded() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &[APP_ORIGIN], &hits);

    let reply = send(&router, post(Some(APP_ORIGIN))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
    assert!(list(&reply.headers, VARY).contains(&"origin".to_string()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(h.logs.find("request completed").len(), 1);
}

#[tokio::test]
async fn unlisted_origin_gets_no_cors_headers() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &[APP_ORIGIN], &hits);

    let reply = send(&router, post(Some("https://evil.example"))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert!(reply.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let reply = send(&router, post(None)).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert!(reply.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &[APP_ORIGIN], &hits);

    let req = Request::get("/nope")
        .header("origin", APP_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let reply = send(&router, req).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], APP_ORIGIN);
}

#[tokio::test]
async fn wildcard_allows_any_origin() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &["*"], &hits);

    let reply = send(&router, preflight("https://anyone.example")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let reply = send(&router, post(Some("https://anyone.example"))).await;
    assert_eq!(reply.headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn disabled_cors_leaves_preflight_to_the_router() {
    let h = harness();
    let hits = Arc::new(AtomicUsize::new(0));
    let router = build(&h, &[], &hits);

    let reply = send(&router, preflight(APP_ORIGIN)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(h.logs.find("request completed").len(), 1);

    let reply = send(&router, post(Some(APP_ORIGIN))).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert!(reply.headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
