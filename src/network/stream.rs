use crate::resp::{Command, RespCodec, Value};
use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Framed;

/// The messaging layer: adapts the [`RespCodec`] to a
/// duplex byte stream and surfaces exactly two operations the connection
/// state machine needs — send a command, await the next response — plus
/// the two housekeeping operations (`send_end_of_stream`, `close`) a
/// lifecycle needs. It knows nothing about pipelining or transactions;
/// that belongs to [`crate::client::NetworkHandler`].
///
/// Generic over the duplex transport so the framed I/O itself (plain TCP,
/// TLS, an in-memory duplex for tests, ...) stays an external collaborator.
pub struct MessageStream<S> {
    framed: Framed<S, RespCodec>,
}

impl<S> MessageStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: S) -> Self {
        Self {
            framed: Framed::new(io, RespCodec),
        }
    }

    /// Sends one command and flushes immediately: completion here means
    /// the command's bytes have reached the transport's write buffer in
    /// full — partial commands never appear on the wire.
    pub async fn send(&mut self, command: Command) -> Result<()> {
        self.framed.send(command).await
    }

    /// Feeds every command in `commands` into the write buffer, then
    /// flushes once. Used by the state machine to batch a burst of
    /// pipelined submissions into a single flush.
    pub async fn send_batch<I>(&mut self, commands: I) -> Result<()>
    where
        I: IntoIterator<Item = Command>,
    {
        for command in commands {
            self.framed.feed(command).await?;
        }
        self.framed.flush().await
    }

    /// Awaits the next fully-parsed response. `None` means the stream
    /// ended (the peer closed the connection); `Some(Err(_))` means a
    /// transport or parse failure, which is always fatal to the
    /// connection.
    pub async fn receive(&mut self) -> Option<Result<Value>> {
        self.framed.next().await
    }

    /// Half-closes the write side.
    pub async fn send_end_of_stream(&mut self) -> Result<()> {
        self.framed.get_mut().shutdown().await?;
        Ok(())
    }
}

impl<S> MessageStream<S> {
    /// Unwraps back to the underlying transport plus any bytes already
    /// buffered but not yet dispatched to a caller.
    pub fn into_inner(self) -> S {
        self.framed.into_inner()
    }
}

/// Convenience used by [`crate::client::NetworkHandler`] to turn a `None`
/// (EOF) from [`MessageStream::receive`] into the same `Result` shape as a
/// real transport error, so the rest of the pipeline never has to special
/// case it.
pub fn eof_error() -> Error {
    Error::Io("connection closed by peer".to_string())
}
