//! Command-line interface definitions using clap derive macros.
//!
//! Every flag has an environment variable equivalent for container
//! deployments.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "webmux",
    version,
    about = "HTTP service with a composed middleware pipeline",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        webmux run                            Serve every route group on :3000\n  \
        webmux run --routes check             Liveness and readiness only\n  \
        webmux health http://localhost:3000   Probe a running instance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API and debug servers
    Run(Box<RunArgs>),

    /// Check liveness of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        webmux run -p 8080 --pretty                              Local dev mode\n  \
        webmux run --cors-origin https://app.example.com         Enable CORS\n  \
        webmux run --auth-token s3cret=alice:ADMIN+USER          Static bearer token")]
pub struct RunArgs {
    /// Listen port for the API
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Listen port for the debug server (metrics and liveness)
    #[arg(long, env = "DEBUG_PORT", default_value_t = 4000)]
    pub debug_port: u16,

    /// Build identifier reported by liveness and /debug/vars
    #[arg(long, env = "BUILD", default_value = env!("WEBMUX_GIT_SHORT"))]
    pub build: String,

    /// Route groups to bind
    #[arg(long, env = "ROUTES", default_value = "all")]
    pub routes: RouteSet,

    // -- Security --
    /// Allowed CORS origin; repeat or comma-separate. `*` allows any origin.
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        help_heading = "Security"
    )]
    pub cors_origins: Vec<String>,

    /// Bearer token as TOKEN=SUBJECT[:ROLE+ROLE]; repeat or comma-separate
    #[arg(
        long = "auth-token",
        env = "AUTH_TOKENS",
        value_delimiter = ',',
        hide_env_values = true,
        help_heading = "Security"
    )]
    pub auth_tokens: Vec<String>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,

    /// Seconds to wait for in-flight requests after a shutdown signal
    #[arg(
        long,
        env = "SHUTDOWN_TIMEOUT_SECS",
        default_value_t = 20,
        help_heading = "Tuning"
    )]
    pub shutdown_timeout: u64,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Which registrar `webmux run` binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RouteSet {
    All,
    Check,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["webmux", "run"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.port, 3000);
        assert_eq!(args.debug_port, 4000);
        assert_eq!(args.routes, RouteSet::All);
        assert!(args.cors_origins.is_empty());
    }

    #[test]
    fn comma_separated_lists() {
        let cli = Cli::try_parse_from([
            "webmux",
            "run",
            "--cors-origin",
            "https://a.example,https://b.example",
            "--auth-token",
            "t1=alice:ADMIN+USER,t2=bob",
            "--routes",
            "check",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.cors_origins, ["https://a.example", "https://b.example"]);
        assert_eq!(args.auth_tokens, ["t1=alice:ADMIN+USER", "t2=bob"]);
        assert_eq!(args.routes, RouteSet::Check);
    }
}
