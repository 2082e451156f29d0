//! webmux is an HTTP service built around a composed request pipeline.
//!
//! Every request passes through a fixed global chain (logging, error
//! normalization, metrics, panic containment), then through any per-route
//! middleware, then reaches its handler. Handlers return typed failures and
//! never write error responses themselves. CORS can be placed in front of the
//! whole pipeline. Route groups are bound by registrars that receive a single
//! capability bundle.
//!
//! # Architecture
//!
//! - [`web`] -- The pipeline builder ([`App`](web::App)), handler and
//!   middleware types, request context, logger/tracer handles and shutdown.
//! - [`middleware`] -- The global stages, CORS and bearer authentication.
//! - [`errs`] -- Request failure kinds and the canonical JSON error body.
//! - [`metrics`] -- Lock-free request counters.
//! - [`mux`] -- Capability bundle, registrar contract and [`web_api`](mux::web_api).
//! - [`build`] -- Registrars for the deployable builds.
//! - [`api`] -- Route groups (checks, homes).
//! - [`domain`] -- Domain cores reached through the bus.
//! - [`auth`] / [`db`] -- Authenticator and database seams.
//! - [`debug`] -- Metrics and liveness on the debug port.
//! - [`cli`] / [`cmd`] / [`logging`] / [`server`] / [`error`] -- The binary.

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod auth;
pub mod build;
pub mod cli;
pub mod cmd;
pub mod db;
pub mod debug;
pub mod domain;
pub mod error;
pub mod errs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod mux;
pub mod server;
pub mod web;
