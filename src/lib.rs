//! A client-side driver for the Redis RESP v2 protocol.
//!
//! Talks RESP directly over a user-supplied duplex byte stream — usually a
//! `tokio::net::TcpStream` — through a single multiplexed connection per
//! [`Client`]: every command submitted through any clone of a `Client` is
//! pipelined onto the same connection and resolved in submission order by
//! one owning task (the [`client`] module's connection state machine).
//!
//! ```no_run
//! use redis_driver::{cmd, Client};
//!
//! # async fn example() -> redis_driver::Result<()> {
//! let client = Client::connect("127.0.0.1:6379").await?;
//! client.send::<()>(cmd("SET").arg("key").arg("value")).await?;
//! let value: Option<String> = client.send(cmd("GET").arg("key")).await?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod commands;
mod error;
mod network;
mod resp;

pub use client::{Charset, Client, Config, IntoConfig, QueuedCommand, Transaction};
#[cfg(feature = "pool")]
pub use client::{Pool, PoolState, PooledConnection};
pub use error::{Error, Result};
pub use resp::{cmd, BulkString, Command, FromValue, Value};
