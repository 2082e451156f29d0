//! Domain cores shipped with the service. Each one is registered in the
//! capability bundle under a fixed name and reached by registrars through
//! [`BusDomain::get`](crate::mux::BusDomain::get).

pub mod home;
