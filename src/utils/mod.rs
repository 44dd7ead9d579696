//! Utility modules

pub mod error;
pub mod resp;

pub use error::{ConnectionError, DiagError, ProtocolError, Result};
pub use resp::{RespDecoder, RespEncoder, RespValue};
