//! Cross-cutting pipeline stages.
//!
//! The global chain is, outermost first: [`logger`] → [`errors`] →
//! [`metrics`] → [`panics`]. [`cors`] sits in front of the whole chain when
//! enabled, and [`authenticate`] is a per-route stage nested inside it.

mod auth;
mod cors;
mod errors;
mod logger;
mod metrics;
mod panics;

pub use auth::{authenticate, identity};
pub use cors::{cors, ALLOW_HEADERS, ALLOW_METHODS, MAX_AGE};
pub use errors::errors;
pub use logger::logger;
pub use metrics::metrics;
pub use panics::{panics, PanicError};
