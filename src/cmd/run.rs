//! `webmux run`: start the API and debug servers.
//!
//! Builds the capability bundle once, binds the selected registrar through
//! [`web_api`](crate::mux::web_api), and serves both listeners until a signal
//! or a handler fires the shared [`Shutdown`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::limit::RequestBodyLimitLayer;

use crate::auth::StaticTokens;
use crate::build;
use crate::cli::{RouteSet, RunArgs};
use crate::db::MemoryDb;
use crate::debug;
use crate::domain::home::HomeCore;
use crate::error::ServiceError;
use crate::logging;
use crate::metrics::Metrics;
use crate::mux::{self, BusDomain, Config, Options, RouteAdder, HOME};
use crate::server;
use crate::web::{Log, Shutdown, Tracer};

const SERVICE_NAME: &str = "webmux";

pub async fn execute(args: RunArgs) -> Result<(), ServiceError> {
    logging::init(&args.log_level, logging::resolve_format(args.pretty, args.json));

    let log = Log::current();
    let shutdown = Shutdown::new();
    let metrics = Arc::new(Metrics::new());

    let tokens = StaticTokens::from_specs(&args.auth_tokens)?;
    if tokens.is_empty() {
        tracing::warn!("no auth tokens configured, authenticated routes will reject every request");
    }

    let mut bus = BusDomain::new();
    bus.insert(HOME, Arc::new(HomeCore::new()))?;

    let cfg = Config {
        build: args.build.clone(),
        shutdown: shutdown.clone(),
        log: log.clone(),
        auth: Arc::new(tokens),
        db: Arc::new(MemoryDb::new()),
        tracer: Tracer::new(SERVICE_NAME, log),
        metrics: Arc::clone(&metrics),
        bus,
    };

    let registrar: &dyn RouteAdder = match args.routes {
        RouteSet::All => &build::All,
        RouteSet::Check => &build::Check,
    };
    let api = mux::web_api(
        &cfg,
        registrar,
        Options::default().with_cors(args.cors_origins.iter().cloned()),
    )?
    .layer(RequestBodyLimitLayer::new(args.max_body));

    let api_addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let debug_addr: SocketAddr = format!("{}:{}", args.host, args.debug_port).parse()?;
    let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
    let debug_listener = tokio::net::TcpListener::bind(debug_addr).await?;

    tracing::info!(
        api = %api_addr,
        debug = %debug_addr,
        build = %args.build,
        "webmux started"
    );

    let signal = shutdown.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        signal.trigger();
    });

    let debug_task = tokio::spawn(server::serve(
        debug_listener,
        debug::router(args.build.clone(), metrics),
        shutdown.clone(),
    ));

    let grace = Duration::from_secs(args.shutdown_timeout);
    let api_task = server::serve(api_listener, api, shutdown.clone());
    tokio::pin!(api_task);

    tokio::select! {
        res = &mut api_task => res?,
        () = shutdown.wait() => {
            tracing::info!(timeout_secs = grace.as_secs(), "shutdown started, draining requests");
            match tokio::time::timeout(grace, &mut api_task).await {
                Ok(res) => res?,
                Err(_) => tracing::warn!("drain timed out, dropping remaining requests"),
            }
        }
    }

    match debug_task.await {
        Ok(res) => res?,
        Err(e) => tracing::error!(error = %e, "debug server task failed"),
    }

    tracing::info!("webmux stopped");
    Ok(())
}
