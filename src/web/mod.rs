//! Pipeline builder: global middleware, per-route middleware, and the route
//! table, composed into one Axum [`Router`].
//!
//! [`App`] is filled during the single-threaded startup phase and consumed by
//! [`App::into_router`], so the route table cannot change once traffic flows.
//! Every route, and the not-found fallback, runs through the same global
//! chain; the optional CORS stage wraps the whole dispatcher and runs before
//! any of it.

mod context;
mod handler;
mod shutdown;
mod trace;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use tower::ServiceExt;
use tracing::Instrument;

use crate::errs::ApiError;

pub use context::{context, RequestContext, REQUEST_ID_HEADER};
pub use handler::{
    from_fn, handler, wrap_middleware, BoxFuture, Handler, HandlerResult, Middleware,
};
pub use shutdown::Shutdown;
pub use trace::{Log, Tracer};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RouteError {
    #[error("route path must start with '/': {0:?}")]
    InvalidPath(String),

    #[error("method {0} cannot be routed")]
    UnsupportedMethod(Method),

    #[error("route pattern {path:?} is invalid: {reason}")]
    InvalidPattern { path: String, reason: &'static str },

    #[error("route pattern {path:?} names a parameter differently than {existing:?}")]
    Conflict { path: String, existing: String },

    #[error("route registered twice: {method} {path}")]
    Duplicate { method: Method, path: String },

    #[error("domain core {0:?} is not in the capability bundle")]
    MissingCore(String),
}

/// The pipeline builder.
pub struct App {
    routes: BTreeMap<String, MethodRouter>,
    registered: HashSet<(Method, String)>,
    // Parameter seen after each erased prefix, and the pattern that introduced it.
    params: HashMap<String, (Param, String)>,
    global: Vec<Middleware>,
    cors: Option<Middleware>,
    shutdown: Shutdown,
    tracer: Tracer,
}

impl App {
    /// `global` is applied outermost-first to every route.
    #[must_use]
    pub fn new(shutdown: Shutdown, tracer: Tracer, global: Vec<Middleware>) -> Self {
        Self {
            routes: BTreeMap::new(),
            registered: HashSet::new(),
            params: HashMap::new(),
            global,
            cors: None,
            shutdown,
            tracer,
        }
    }

    /// Installs the CORS stage, evaluated before the global chain.
    pub fn enable_cors(&mut self, mw: Middleware) {
        self.cors = Some(mw);
    }

    /// Asks the hosting server to stop accepting work.
    pub fn signal_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Registers `handler` for `method` + `path`. `extra` middleware nests
    /// inside the global chain, directly around the handler.
    pub fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
        extra: &[Middleware],
    ) -> Result<(), RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.to_string()));
        }
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod(method.clone()))?;

        let params = parse_pattern(path)?;
        for (prefix, param) in &params {
            if let Some((seen, existing)) = self.params.get(prefix) {
                if seen != param {
                    return Err(RouteError::Conflict {
                        path: path.to_string(),
                        existing: existing.clone(),
                    });
                }
            }
        }
        if !self.registered.insert((method.clone(), path.to_string())) {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }
        for (prefix, param) in params {
            self.params
                .entry(prefix)
                .or_insert_with(|| (param, path.to_string()));
        }

        let composed = wrap_middleware(&self.global, wrap_middleware(extra, handler));
        let ep = Endpoint {
            tracer: self.tracer.clone(),
            handler: composed,
        };

        let methods = self.routes.remove(path).unwrap_or_else(MethodRouter::new);
        self.routes.insert(
            path.to_string(),
            methods.on(filter, move |req: Request| ep.clone().run(req)),
        );

        self.tracer
            .log()
            .emit(|| tracing::debug!(method = %method, path = %path, "route registered"));
        Ok(())
    }

    /// Number of (method, path) pairs registered so far.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.registered.len()
    }

    /// Freezes the route table into a router.
    #[must_use]
    pub fn into_router(self) -> Router {
        let not_found = Endpoint {
            tracer: self.tracer.clone(),
            handler: wrap_middleware(
                &self.global,
                handler(|_req| async { Err::<Response, _>(ApiError::not_found("route not found")) }),
            ),
        };

        let mut router = Router::new();
        for (path, methods) in self.routes {
            let ep = not_found.clone();
            router = router.route(
                &path,
                methods.fallback(move |req: Request| ep.clone().run(req)),
            );
        }
        let router = router.fallback(move |req: Request| not_found.clone().run(req));

        let Some(cors) = self.cors else {
            return router;
        };

        let dispatch: Handler = Arc::new(move |req: Request| -> BoxFuture<HandlerResult> {
            let router = router.clone();
            Box::pin(async move {
                match router.oneshot(req).await {
                    Ok(resp) => Ok(resp),
                    Err(never) => match never {},
                }
            })
        });
        let root = cors(dispatch);

        Router::new().fallback(move |req: Request| {
            let root = Arc::clone(&root);
            async move { root(req).await.unwrap_or_else(IntoResponse::into_response) }
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Param {
    name: String,
    catch_all: bool,
}

/// Validates `path` against the router's pattern syntax and returns each
/// parameter keyed by the preceding segments with parameter names erased.
/// The router requires every pattern to agree on the parameter at a given
/// erased prefix.
fn parse_pattern(path: &str) -> Result<Vec<(String, Param)>, RouteError> {
    let invalid = |reason| RouteError::InvalidPattern {
        path: path.to_string(),
        reason,
    };

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    let mut names = HashSet::new();
    let mut prefix = String::new();
    let mut params = Vec::new();

    for (i, seg) in segments.iter().enumerate() {
        if !seg.contains(['{', '}']) {
            prefix.push('/');
            prefix.push_str(seg);
            continue;
        }

        let inner = seg
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| invalid("a parameter must fill a whole segment as {name}"))?;
        let (catch_all, name) = match inner.strip_prefix('*') {
            Some(name) => (true, name),
            None => (false, inner),
        };
        if name.is_empty() || name.contains(['{', '}', '*']) {
            return Err(invalid("parameters need a plain name"));
        }
        if catch_all && i + 1 != segments.len() {
            return Err(invalid("a catch-all parameter must be the last segment"));
        }
        if !names.insert(name) {
            return Err(invalid("parameter name used twice"));
        }

        params.push((
            prefix.clone(),
            Param {
                name: name.to_string(),
                catch_all,
            },
        ));
        prefix.push_str(if catch_all { "/{*}" } else { "/{}" });
    }

    Ok(params)
}

/// Chain entry for one composed route: creates the request context and runs
/// the chain inside the request span.
#[derive(Clone)]
struct Endpoint {
    tracer: Tracer,
    handler: Handler,
}

impl Endpoint {
    async fn run(self, mut req: Request) -> Response {
        let ctx = RequestContext::new(&self.tracer, &req);
        let span = ctx.span.clone();
        req.extensions_mut().insert(ctx);

        let fut = span.in_scope(|| (self.handler)(req));
        match fut.instrument(span).await {
            Ok(resp) => resp,
            // Only reachable for a chain built without error normalization.
            Err(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;

    use super::*;

    fn app() -> App {
        let log = Log::current();
        App::new(Shutdown::new(), Tracer::new("test", log), Vec::new())
    }

    fn ok() -> Handler {
        handler(|_req| async { Ok::<_, ApiError>(StatusCode::OK) })
    }

    #[test]
    fn rejects_relative_path() {
        let mut app = app();
        let err = app.handle(Method::GET, "v1/home", ok(), &[]).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPath(_)));
    }

    #[test]
    fn rejects_duplicate_route() {
        let mut app = app();
        app.handle(Method::GET, "/v1/home", ok(), &[]).unwrap();
        app.handle(Method::POST, "/v1/home", ok(), &[]).unwrap();
        let err = app.handle(Method::GET, "/v1/home", ok(), &[]).unwrap_err();
        assert!(matches!(err, RouteError::Duplicate { .. }));
        assert_eq!(app.route_count(), 2);
    }

    #[test]
    fn rejects_malformed_patterns() {
        let mut app = app();
        for bad in ["/v1/{broken", "/v1/broken}", "/v1/x{id}", "/v1/{}", "/v1/{*rest}/tail", "/v1/{id}/{id}"] {
            let err = app.handle(Method::GET, bad, ok(), &[]).unwrap_err();
            assert!(matches!(err, RouteError::InvalidPattern { .. }), "{bad}: {err}");
        }
        assert_eq!(app.route_count(), 0);
    }

    #[test]
    fn rejects_renamed_parameter() {
        let mut app = app();
        app.handle(Method::GET, "/v1/homes/{home_id}", ok(), &[]).unwrap();
        app.handle(Method::DELETE, "/v1/homes/{home_id}", ok(), &[]).unwrap();
        app.handle(Method::GET, "/v1/homes/{home_id}/rooms", ok(), &[]).unwrap();

        let err = app.handle(Method::DELETE, "/v1/homes/{id}", ok(), &[]).unwrap_err();
        match err {
            RouteError::Conflict { path, existing } => {
                assert_eq!(path, "/v1/homes/{id}");
                assert_eq!(existing, "/v1/homes/{home_id}");
            }
            other => panic!("unexpected {other}"),
        }
        let err = app.handle(Method::GET, "/v1/homes/{*rest}", ok(), &[]).unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
        assert_eq!(app.route_count(), 3);
    }

    #[tokio::test]
    async fn router_builds_after_rejected_patterns() {
        let mut app = app();
        app.handle(Method::GET, "/v1/homes/{home_id}", ok(), &[]).unwrap();
        assert!(app.handle(Method::GET, "/v1/homes/{id}", ok(), &[]).is_err());
        assert!(app.handle(Method::GET, "/v1/{broken", ok(), &[]).is_err());

        let req = Request::builder()
            .uri("/v1/homes/42")
            .body(Body::empty())
            .unwrap();
        let resp = app.into_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn signal_shutdown_fires_handle() {
        let shutdown = Shutdown::new();
        let app = App::new(shutdown.clone(), Tracer::new("test", Log::current()), Vec::new());
        app.signal_shutdown();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn handler_sees_request_context() {
        let mut app = app();
        let h = handler(|req: Request| async move {
            let id = context(&req).map(|c| c.request_id.clone()).unwrap_or_default();
            Ok::<_, ApiError>(id)
        });
        app.handle(Method::GET, "/id", h, &[]).unwrap();

        let req = Request::builder()
            .uri("/id")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = app.into_router().oneshot(req).await.unwrap();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"abc-123");
    }
}
