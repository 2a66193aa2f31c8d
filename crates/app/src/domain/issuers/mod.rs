//! Signing Issuers

pub mod models;
pub(crate) mod repository;

pub(crate) use repository::PgIssuersRepository;
