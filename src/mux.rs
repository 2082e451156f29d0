//! Binds domain routes to the pipeline.
//!
//! [`Config`] is the capability bundle handed to every registrar,
//! [`RouteAdder`] is the registrar contract, and [`web_api`] assembles the
//! global middleware chain, runs the registrar once, and returns the frozen
//! router.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::Router;

use crate::auth::Authenticator;
use crate::db::Database;
use crate::metrics::Metrics;
use crate::middleware;
use crate::web::{App, Log, Middleware, RouteError, Shutdown, Tracer};

pub const HOME: &str = "home";

#[derive(Debug, thiserror::Error)]
#[error("domain core {0:?} registered twice")]
pub struct DuplicateCore(pub String);

/// Domain cores keyed by name.
#[derive(Clone, Default)]
pub struct BusDomain {
    cores: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl BusDomain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T>(&mut self, name: impl Into<String>, core: Arc<T>) -> Result<(), DuplicateCore>
    where
        T: Any + Send + Sync,
    {
        let name = name.into();
        if self.cores.contains_key(&name) {
            return Err(DuplicateCore(name));
        }
        self.cores.insert(name, core);
        Ok(())
    }

    /// The core registered under `name`, if it has type `T`.
    #[must_use]
    pub fn get<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let core = Arc::clone(self.cores.get(name)?);
        core.downcast::<T>().ok()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cores.keys().map(String::as_str)
    }
}

impl fmt::Debug for BusDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("BusDomain").field("cores", &names).finish()
    }
}

/// Everything a registrar or handler may depend on. Built once at startup.
#[derive(Clone)]
pub struct Config {
    pub build: String,
    pub shutdown: Shutdown,
    pub log: Log,
    pub auth: Arc<dyn Authenticator>,
    pub db: Arc<dyn Database>,
    pub tracer: Tracer,
    pub metrics: Arc<Metrics>,
    pub bus: BusDomain,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("build", &self.build)
            .field("db", &self.db.name())
            .field("tracer", &self.tracer.service())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// Optional pipeline settings.
#[derive(Debug, Clone, Default)]
pub struct Options {
    cors_origins: Vec<String>,
}

impl Options {
    /// Allowed CORS origins. An empty list leaves CORS disabled.
    #[must_use]
    pub fn with_cors<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }
}

/// Registers the routes of one deployable build.
pub trait RouteAdder: Send + Sync {
    fn add(&self, app: &mut App, cfg: &Config) -> Result<(), RouteError>;
}

impl<F> RouteAdder for F
where
    F: Fn(&mut App, &Config) -> Result<(), RouteError> + Send + Sync,
{
    fn add(&self, app: &mut App, cfg: &Config) -> Result<(), RouteError> {
        self(app, cfg)
    }
}

/// The fixed global chain, outermost first.
#[must_use]
pub fn global_middleware(cfg: &Config) -> Vec<Middleware> {
    vec![
        middleware::logger(cfg.log.clone()),
        middleware::errors(cfg.log.clone()),
        middleware::metrics(Arc::clone(&cfg.metrics)),
        middleware::panics(Arc::clone(&cfg.metrics), cfg.log.clone()),
    ]
}

/// Builds the request handler with every route from `route_adder` bound.
pub fn web_api(
    cfg: &Config,
    route_adder: &dyn RouteAdder,
    options: Options,
) -> Result<Router, RouteError> {
    let mut app = App::new(
        cfg.shutdown.clone(),
        cfg.tracer.clone(),
        global_middleware(cfg),
    );

    if !options.cors_origins.is_empty() {
        cfg.log
            .emit(|| tracing::info!(origins = ?options.cors_origins, "cors enabled"));
        app.enable_cors(middleware::cors(&options.cors_origins));
    }

    route_adder.add(&mut app, cfg)?;
    let routes = app.route_count();
    cfg.log
        .emit(|| tracing::info!(routes, build = %cfg.build, "routes bound"));

    Ok(app.into_router())
}
