//! RESP v2 wire format: the byte <-> `Value`/`Command` codec, the command builder, and the typed response parsers. Stateless beyond the codec's partial-frame buffer.

mod bulk_string;
mod codec;
mod command;
mod from_value;
mod value;

pub use bulk_string::BulkString;
pub use codec::RespCodec;
pub use command::{cmd, Command, CommandArgs, IntoArgs};
pub use from_value::{bulk, double, expect_ok, map, scan_result, set, simple_string, FromValue};
pub use value::Value;
