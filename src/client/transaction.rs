use super::client::Client;
use super::message::{Submission, ValueReceiver};
use crate::resp::{cmd, Command, FromValue, Value};
use crate::{Error, Result};
use futures_channel::oneshot;
use std::marker::PhantomData;

/// A MULTI/EXEC/DISCARD transaction scoped to one [`Client`]. `multi()`
/// opens it, `queue()` appends commands and hands back a handle to each
/// one's eventual result, `exec()`/`discard()` close it.
pub struct Transaction {
    client: Client,
    open: bool,
}

impl Transaction {
    pub(crate) fn new(client: Client) -> Self {
        Self { client, open: false }
    }

    /// Sends `MULTI`. Must be called exactly once, before any `queue()`.
    pub async fn multi(&mut self) -> Result<()> {
        if self.open {
            return Err(Error::Client(
                "multi() called on an already-open transaction".to_string(),
            ));
        }
        self.client.send::<()>(cmd("MULTI")).await?;
        self.open = true;
        Ok(())
    }

    /// Queues one command. The immediate reply (`+QUEUED`) is consumed by
    /// the connection state machine and never surfaces here — the typed
    /// result arrives only once [`Self::exec`] completes, through the
    /// returned [`QueuedCommand`].
    pub fn queue<T: FromValue>(&mut self, command: Command) -> Result<QueuedCommand<T>> {
        if !self.open {
            return Err(Error::Client("queue() called before multi()".to_string()));
        }
        let (tx, rx) = oneshot::channel();
        self.client.submit(Submission::new(command, tx))?;
        Ok(QueuedCommand {
            receiver: rx,
            _marker: PhantomData,
        })
    }

    /// Sends `EXEC` and returns the raw per-command results in submission
    /// order, or an empty vector if a watched key changed — in that case every [`QueuedCommand`] handed out by
    /// this transaction resolves to `Error::TransactionFailed` instead.
    pub async fn exec(mut self) -> Result<Vec<Value>> {
        if !self.open {
            return Err(Error::Client("exec() called before multi()".to_string()));
        }
        self.open = false;
        match self.client.send::<Value>(cmd("EXEC")).await? {
            Value::Array(items) => Ok(items),
            Value::Nil => Ok(Vec::new()),
            other => Err(Error::UnexpectedResponse(format!(
                "unexpected EXEC result: {other:?}"
            ))),
        }
    }

    /// Sends `DISCARD`. Every [`QueuedCommand`] handed out by this
    /// transaction resolves to `Error::TransactionDiscarded`.
    pub async fn discard(mut self) -> Result<()> {
        if !self.open {
            return Err(Error::Client("discard() called before multi()".to_string()));
        }
        self.open = false;
        self.client.send::<()>(cmd("DISCARD")).await
    }
}

/// A handle to one queued command's eventual result, returned by
/// [`Transaction::queue`]. Resolves once the owning transaction's `exec()`,
/// `discard()`, or an aborting failure completes.
pub struct QueuedCommand<T> {
    receiver: ValueReceiver,
    _marker: PhantomData<T>,
}

impl<T: FromValue> QueuedCommand<T> {
    pub async fn wait(self) -> Result<T> {
        let value = self.receiver.await.map_err(Error::from)??;
        T::from_value(value)
    }
}
