use crate::client::Client;
use crate::resp::{cmd, BulkString};
use crate::Result;

/// Sorted set commands.
pub trait SortedSetCommands {
    /// `ZADD key score member`.
    async fn zadd(
        &self,
        key: impl Into<BulkString> + Send,
        score: f64,
        member: impl Into<BulkString> + Send,
    ) -> Result<i64>;

    /// `ZSCORE key member`.
    async fn zscore(
        &self,
        key: impl Into<BulkString> + Send,
        member: impl Into<BulkString> + Send,
    ) -> Result<Option<f64>>;
}

impl SortedSetCommands for Client {
    async fn zadd(
        &self,
        key: impl Into<BulkString> + Send,
        score: f64,
        member: impl Into<BulkString> + Send,
    ) -> Result<i64> {
        self.send(
            cmd("ZADD")
                .arg(key.into())
                .arg(BulkString::from(score))
                .arg(member.into()),
        )
        .await
    }

    async fn zscore(
        &self,
        key: impl Into<BulkString> + Send,
        member: impl Into<BulkString> + Send,
    ) -> Result<Option<f64>> {
        let value = self.send(cmd("ZSCORE").arg(key.into()).arg(member.into())).await?;
        match value {
            crate::Value::Nil => Ok(None),
            other => crate::resp::double(other).map(Some),
        }
    }
}
