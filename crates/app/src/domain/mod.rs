//! Orders, issuers, and the credentials issued against them

pub mod credentials;
pub mod issuers;
pub mod orders;
