use super::config::{Charset, Config, IntoConfig};
use super::message::{Submission, ValueReceiver};
use super::network_handler::NetworkHandler;
use super::state::ConnectionState;
use super::transaction::Transaction;
use crate::resp::{cmd, FromValue, Value};
use crate::{Error, Result};
use futures_channel::{mpsc, oneshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// The public entry point: a cheap, `Clone`able handle
/// to one multiplexed connection's mailbox. Every clone feeds the same
/// [`NetworkHandler`] task, so every clone observes the same response
/// ordering and the same transaction state.
#[derive(Clone)]
pub struct Client {
    sender: mpsc::UnboundedSender<Submission>,
    state: ConnectionState,
    charset: Charset,
    request_timeout: Option<Duration>,
    tag: Arc<str>,
}

impl Client {
    /// Opens a TCP connection, spawns its [`NetworkHandler`], and — before
    /// returning — issues `AUTH`/`SELECT` synchronously if the config asks
    /// for them, so a freshly connected `Client` is always ready to use.
    pub async fn connect(config: impl IntoConfig) -> Result<Self> {
        let config = config.into_config()?;

        let connect = TcpStream::connect(&config.server_address);
        let stream = match config.connect_timeout {
            Some(duration) => tokio::time::timeout(duration, connect)
                .await
                .map_err(|_| Error::Timeout)??,
            None => connect.await?,
        };
        stream.set_nodelay(true).ok();

        let tag: Arc<str> = Arc::from(config.server_address.as_str());
        let (sender, state) = NetworkHandler::spawn(stream, tag.to_string());

        let client = Client {
            sender,
            state,
            charset: config.charset,
            request_timeout: config.request_timeout,
            tag,
        };

        client.authenticate(&config).await?;
        Ok(client)
    }

    async fn authenticate(&self, config: &Config) -> Result<()> {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                self.send::<()>(cmd("AUTH").arg(username.as_str()).arg(password.as_str()))
                    .await?;
            }
            (None, Some(password)) => {
                self.send::<()>(cmd("AUTH").arg(password.as_str())).await?;
            }
            (Some(_), None) => {
                return Err(Error::Client(
                    "username configured without a password".to_string(),
                ))
            }
            (None, None) => {}
        }

        if let Some(index) = config.database_index {
            self.send::<()>(cmd("SELECT").arg(index as i64)).await?;
        }

        Ok(())
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// True once the connection has closed, whether from a transport
    /// error, a protocol framing fault, or a graceful shutdown.
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub(crate) fn submit(&self, submission: Submission) -> Result<()> {
        self.sender
            .unbounded_send(submission)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Submits one command and awaits its typed response. Response ordering is FIFO relative to every other `send` on
    /// this `Client` or any of its clones.
    pub async fn send<T: FromValue>(&self, command: crate::resp::Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.submit(Submission::new(command, tx))?;
        let value = await_response(rx, self.request_timeout).await?;
        T::from_value(value)
    }

    /// Submits a command without registering a response waiter at all —
    /// the state machine still writes it to the wire and still consumes
    /// its reply from the stream, but no channel is allocated for it.
    pub async fn send_and_forget(&self, command: crate::resp::Command) -> Result<()> {
        self.submit(Submission::forget(command))
    }

    /// Submits every command in `commands` before awaiting any response,
    /// so they share the state machine's next flush instead of each
    /// paying its own round trip.
    /// Results preserve submission order; one command failing does not
    /// prevent the others from resolving.
    pub async fn send_batch(&self, commands: Vec<crate::resp::Command>) -> Result<Vec<Result<Value>>> {
        let mut receivers = Vec::with_capacity(commands.len());
        for command in commands {
            let (tx, rx) = oneshot::channel();
            self.submit(Submission::new(command, tx))?;
            receivers.push(rx);
        }

        let mut results = Vec::with_capacity(receivers.len());
        for rx in receivers {
            results.push(await_response(rx, self.request_timeout).await);
        }
        Ok(results)
    }

    /// Opens a [`Transaction`] scoped to this connection. Nothing is written to the wire until [`Transaction::multi`]
    /// is called.
    pub fn create_transaction(&self) -> Transaction {
        Transaction::new(self.clone())
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub(crate) fn tag(&self) -> &str {
        &self.tag
    }
}

async fn await_response(rx: ValueReceiver, timeout: Option<Duration>) -> Result<Value> {
    let outcome = match timeout {
        Some(duration) => match tokio::time::timeout(duration, rx).await {
            Ok(inner) => inner,
            Err(_) => return Err(Error::Timeout),
        },
        None => rx.await,
    };
    outcome.map_err(Error::from)?
}
