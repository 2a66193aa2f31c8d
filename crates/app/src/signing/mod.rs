//! Blind-signer wire contract.

pub mod associated_data;
pub mod codec;
pub mod messages;

pub use associated_data::{AssociatedData, AssociatedDataError};
pub use codec::{CodecError, CodecRegistry, MessageKind};
pub use messages::*;
