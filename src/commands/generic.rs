use crate::client::Client;
use crate::resp::{cmd, BulkString};
use crate::Result;

/// Key-agnostic commands that apply regardless of a value's type.
pub trait GenericCommands {
    /// `DEL key [key ...]`, returns the number of keys removed.
    async fn del(&self, keys: Vec<BulkString>) -> Result<i64>;

    /// `EXISTS key`, as a boolean rather than the raw 0/1 integer.
    async fn exists(&self, key: impl Into<BulkString> + Send) -> Result<bool>;

    /// `EXPIRE key seconds`.
    async fn expire(&self, key: impl Into<BulkString> + Send, seconds: i64) -> Result<bool>;

    /// `TTL key`, `None` when the key has no expiry or does not exist.
    async fn ttl(&self, key: impl Into<BulkString> + Send) -> Result<Option<i64>>;
}

impl GenericCommands for Client {
    async fn del(&self, keys: Vec<BulkString>) -> Result<i64> {
        self.send(cmd("DEL").args(keys)).await
    }

    async fn exists(&self, key: impl Into<BulkString> + Send) -> Result<bool> {
        let count: i64 = self.send(cmd("EXISTS").arg(key.into())).await?;
        Ok(count != 0)
    }

    async fn expire(&self, key: impl Into<BulkString> + Send, seconds: i64) -> Result<bool> {
        self.send(cmd("EXPIRE").arg(key.into()).arg(seconds)).await
    }

    async fn ttl(&self, key: impl Into<BulkString> + Send) -> Result<Option<i64>> {
        let ttl: i64 = self.send(cmd("TTL").arg(key.into())).await?;
        Ok(if ttl < 0 { None } else { Some(ttl) })
    }
}
