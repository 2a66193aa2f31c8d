//! SKU order and credential issuance: domain services, persistence, and the
//! signing pipeline workers.

pub mod bus;
pub mod context;
pub mod correlator;
pub mod database;
pub mod domain;
pub mod intervals;
pub mod macaroon;
pub mod outbox;
pub mod shutdown;
pub mod signing;

#[cfg(test)]
mod test;

pub mod uuids;
