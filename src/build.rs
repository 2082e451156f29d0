//! Registrars for the deployable builds.

use crate::api::{checkapi, homeapi};
use crate::mux::{Config, RouteAdder};
use crate::web::{App, RouteError};

/// Every route group.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl RouteAdder for All {
    fn add(&self, app: &mut App, cfg: &Config) -> Result<(), RouteError> {
        checkapi::routes(app, cfg)?;
        homeapi::routes(app, cfg)
    }
}

/// Liveness and readiness only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Check;

impl RouteAdder for Check {
    fn add(&self, app: &mut App, cfg: &Config) -> Result<(), RouteError> {
        checkapi::routes(app, cfg)
    }
}
