use crate::client::Client;
use crate::resp::{cmd, BulkString};
use crate::Result;

/// List commands.
pub trait ListCommands {
    /// `LPUSH key value [value ...]`, returns the list's new length.
    async fn lpush(&self, key: impl Into<BulkString> + Send, values: Vec<BulkString>) -> Result<i64>;

    /// `LRANGE key start stop`.
    async fn lrange(
        &self,
        key: impl Into<BulkString> + Send,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>>;
}

impl ListCommands for Client {
    async fn lpush(&self, key: impl Into<BulkString> + Send, values: Vec<BulkString>) -> Result<i64> {
        self.send(cmd("LPUSH").arg(key.into()).args(values)).await
    }

    async fn lrange(
        &self,
        key: impl Into<BulkString> + Send,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>> {
        self.send(cmd("LRANGE").arg(key.into()).arg(start).arg(stop)).await
    }
}
