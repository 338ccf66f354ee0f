use crate::client::Client;
use crate::resp::{cmd, BulkString};
use crate::Result;
use std::collections::HashSet;

/// Set commands.
pub trait SetCommands {
    /// `SADD key member [member ...]`, returns the number of members added.
    async fn sadd(&self, key: impl Into<BulkString> + Send, members: Vec<BulkString>) -> Result<i64>;

    /// `SMEMBERS key`.
    async fn smembers(&self, key: impl Into<BulkString> + Send) -> Result<HashSet<String>>;
}

impl SetCommands for Client {
    async fn sadd(&self, key: impl Into<BulkString> + Send, members: Vec<BulkString>) -> Result<i64> {
        self.send(cmd("SADD").arg(key.into()).args(members)).await
    }

    async fn smembers(&self, key: impl Into<BulkString> + Send) -> Result<HashSet<String>> {
        let value = self.send(cmd("SMEMBERS").arg(key.into())).await?;
        crate::resp::set(value)
    }
}
