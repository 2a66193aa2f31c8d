//! Credential Repositories

mod single_use;
mod time_limited_v2;

pub(crate) use single_use::PgSingleUseCredentialsRepository;
pub(crate) use time_limited_v2::PgTimeLimitedV2CredentialsRepository;
