//! Signed-Result Correlator
//!
//! Consumes signing results, matches each entry back to its order item
//! through the associated data, and stores the signed material. Every write
//! is idempotent so redelivered results converge on the same state.

pub mod errors;
pub mod service;

pub use errors::{CorrelatorError, EntryError};
pub use service::{CorrelationReport, EntryFailure, SigningResultCorrelator};
