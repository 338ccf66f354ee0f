//! The messaging layer: a thin adapter between the RESP
//! codec and a duplex byte stream.

mod stream;

pub use stream::{eof_error, MessageStream};
