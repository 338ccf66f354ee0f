use crate::client::Client;
use crate::resp::{cmd, BulkString};
use crate::Result;
use std::collections::HashMap;

/// Hash commands.
pub trait HashCommands {
    /// `HSET key field value`.
    async fn hset(
        &self,
        key: impl Into<BulkString> + Send,
        field: impl Into<BulkString> + Send,
        value: impl Into<BulkString> + Send,
    ) -> Result<()>;

    /// `HGET key field`.
    async fn hget(
        &self,
        key: impl Into<BulkString> + Send,
        field: impl Into<BulkString> + Send,
    ) -> Result<Option<String>>;

    /// `HGETALL key`.
    async fn hgetall(&self, key: impl Into<BulkString> + Send) -> Result<HashMap<String, String>>;
}

impl HashCommands for Client {
    async fn hset(
        &self,
        key: impl Into<BulkString> + Send,
        field: impl Into<BulkString> + Send,
        value: impl Into<BulkString> + Send,
    ) -> Result<()> {
        self.send(cmd("HSET").arg(key.into()).arg(field.into()).arg(value.into()))
            .await
    }

    async fn hget(
        &self,
        key: impl Into<BulkString> + Send,
        field: impl Into<BulkString> + Send,
    ) -> Result<Option<String>> {
        self.send(cmd("HGET").arg(key.into()).arg(field.into())).await
    }

    async fn hgetall(&self, key: impl Into<BulkString> + Send) -> Result<HashMap<String, String>> {
        let value = self.send(cmd("HGETALL").arg(key.into())).await?;
        crate::resp::map(value)
    }
}
