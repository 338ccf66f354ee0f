//! Typed command wrappers.
//!
//! Every Redis opcode follows the same shape: build a [`crate::Command`],
//! submit it through [`crate::Client::send`], and select the right typed
//! parser for its reply. Argument ordering contributes no algorithmic depth
//! of its own, so this module is a representative slice of Redis's command
//! surface rather than an exhaustive transcription of it — enough commands
//! per group to show the pattern, not all ~200 opcodes.

mod generic;
mod hash;
mod list;
mod server;
mod set;
mod sorted_set;
mod string;

pub use generic::GenericCommands;
pub use hash::HashCommands;
pub use list::ListCommands;
pub use server::ServerCommands;
pub use set::SetCommands;
pub use sorted_set::SortedSetCommands;
pub use string::StringCommands;
