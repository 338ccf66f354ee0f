use crate::client::Client;
use crate::resp::{cmd, BulkString};
use crate::Result;

/// A representative slice of Redis's string commands.
pub trait StringCommands {
    /// `GET key`.
    async fn get(&self, key: impl Into<BulkString> + Send) -> Result<Option<String>>;

    /// `SET key value`.
    async fn set(
        &self,
        key: impl Into<BulkString> + Send,
        value: impl Into<BulkString> + Send,
    ) -> Result<()>;

    /// `INCR key`.
    async fn incr(&self, key: impl Into<BulkString> + Send) -> Result<i64>;
}

impl StringCommands for Client {
    async fn get(&self, key: impl Into<BulkString> + Send) -> Result<Option<String>> {
        self.send(cmd("GET").arg(key.into())).await
    }

    async fn set(
        &self,
        key: impl Into<BulkString> + Send,
        value: impl Into<BulkString> + Send,
    ) -> Result<()> {
        self.send(cmd("SET").arg(key.into()).arg(value.into())).await
    }

    async fn incr(&self, key: impl Into<BulkString> + Send) -> Result<i64> {
        self.send(cmd("INCR").arg(key.into())).await
    }
}
