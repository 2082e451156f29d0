//! Process-level errors for the `webmux` binary.
//!
//! Request failures are [`ApiError`](crate::errs::ApiError) and never reach
//! this type; [`ServiceError`] covers startup, serving and the `health`
//! subcommand.

use crate::auth::AuthError;
use crate::mux::DuplicateCore;
use crate::web::RouteError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Route registration failed: {0}")]
    Route(#[from] RouteError),

    #[error("{0}")]
    DuplicateCore(#[from] DuplicateCore),

    #[error("Invalid auth configuration: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}
