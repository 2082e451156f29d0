//! Shared fixtures: a capability bundle whose logger writes JSON lines into
//! memory, and a helper that drives a router without a socket.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;
use webmux::auth::{Identity, StaticTokens, ROLE_ADMIN, ROLE_USER};
use webmux::db::MemoryDb;
use webmux::domain::home::HomeCore;
use webmux::metrics::Metrics;
use webmux::mux::{BusDomain, Config, HOME};
use webmux::web::{Log, Shutdown, Tracer};

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";
pub const ROOT: &str = "root-token";

/// In-memory sink for the JSON formatter.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Capture {
    /// Every record written so far, parsed.
    pub fn records(&self) -> Vec<serde_json::Value> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    /// Messages in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|r| r["message"].as_str().map(str::to_owned))
            .collect()
    }

    /// Position to pass to [`Capture::messages_since`].
    pub fn mark(&self) -> usize {
        self.messages().len()
    }

    /// Messages emitted after `mark`, in order.
    pub fn messages_since(&self, mark: usize) -> Vec<String> {
        self.messages().split_off(mark)
    }

    pub fn find(&self, message: &str) -> Vec<serde_json::Value> {
        self.records()
            .into_iter()
            .filter(|r| r["message"] == message)
            .collect()
    }
}

pub struct Harness {
    pub cfg: Config,
    pub logs: Capture,
    pub db: Arc<MemoryDb>,
    pub metrics: Arc<Metrics>,
}

pub fn harness() -> Harness {
    harness_with_bus(true)
}

pub fn harness_with_bus(with_home: bool) -> Harness {
    let logs = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(logs.clone())
        .finish();
    let log = Log::new(tracing::Dispatch::new(subscriber));

    let tokens = StaticTokens::new()
        .with_token(ALICE, Identity::new("alice", &[ROLE_USER]))
        .with_token(BOB, Identity::new("bob", &[ROLE_USER]))
        .with_token(ROOT, Identity::new("root", &[ROLE_ADMIN]));

    let mut bus = BusDomain::new();
    if with_home {
        bus.insert(HOME, Arc::new(HomeCore::new())).unwrap();
    }

    let db = Arc::new(MemoryDb::new());
    let metrics = Arc::new(Metrics::new());
    let cfg = Config {
        build: "test-build".into(),
        shutdown: Shutdown::new(),
        log: log.clone(),
        auth: Arc::new(tokens),
        db: Arc::clone(&db) as Arc<dyn webmux::db::Database>,
        tracer: Tracer::new("webmux-test", log),
        metrics: Arc::clone(&metrics),
        bus,
    };

    Harness {
        cfg,
        logs,
        db,
        metrics,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: bytes::Bytes,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(router: &Router, req: Request<Body>) -> Reply {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    Reply {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
