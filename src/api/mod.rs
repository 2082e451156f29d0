//! Route groups. Each exposes `routes(app, cfg)`; the registrars in
//! [`build`](crate::build) decide which groups a deployment binds.

pub mod checkapi;
pub mod homeapi;
