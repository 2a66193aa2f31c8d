//! Handler helpers

mod depot;
mod headers;

pub(crate) use depot::StateDepotExt as _;
pub(crate) use headers::HeadersExt as _;
