//! The client-facing layer: configuration, the connection state machine,
//! the public [`Client`] handle, transactions, and the connection pool.

mod client;
mod config;
mod message;
mod network_handler;
#[cfg(feature = "pool")]
mod pool;
mod state;
mod transaction;

pub use client::Client;
pub use config::{Charset, Config, IntoConfig};
#[cfg(feature = "pool")]
pub use pool::{Pool, PoolState, PooledConnection};
pub use transaction::{QueuedCommand, Transaction};
