use super::client::Client;
use super::config::{Config, IntoConfig};
use crate::{Error, Result};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A bounded pool of [`Client`] connections.
///
/// Health is checked at *release* time rather than at acquire time:
/// nothing short of the connection's own state can answer "does this
/// connection still have outstanding responses in flight, or is it
/// mid-transaction", which is exactly what this pool needs to decide
/// whether a connection is safe to hand to the next caller. See
/// `DESIGN.md` for the tradeoffs against a library-managed pool.
pub struct Pool {
    config: Config,
    semaphore: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<Client>>>,
    shut_down: Arc<AtomicBool>,
}

impl Pool {
    pub fn new(config: impl IntoConfig) -> Result<Self> {
        let config = config.into_config()?;
        let max_connections = config.max_connections.max(1);
        Ok(Self {
            config,
            semaphore: Arc::new(Semaphore::new(max_connections)),
            idle: Arc::new(Mutex::new(Vec::new())),
            shut_down: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Waits for capacity, then hands back an idle connection if one is
    /// available, or opens a fresh one otherwise. A connection plucked
    /// from the idle set that has since closed (e.g. the server dropped
    /// it) is replaced transparently.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Client("pool has been shut down".to_string()))?;

        let reused = self.idle.lock().unwrap().pop();
        let client = match reused {
            Some(client) if !client.is_closed() => client,
            _ => Client::connect(self.config.clone()).await?,
        };

        Ok(PooledConnection {
            client: Some(client),
            idle: self.idle.clone(),
            shut_down: self.shut_down.clone(),
            _permit: permit,
        })
    }

    /// Introspection snapshot, cheap and useful for tests and diagnostics.
    pub fn state(&self) -> PoolState {
        PoolState {
            idle_connections: self.idle.lock().unwrap().len(),
            max_connections: self.config.max_connections,
        }
    }

    /// Closes every idle connection and rejects every future `acquire()`.
    /// Connections already checked out keep running until their caller
    /// releases or drops them; from that point on `release`/`Drop` discard
    /// the connection instead of returning it to the idle set.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        self.semaphore.close();
        self.idle.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PoolState {
    pub idle_connections: usize,
    pub max_connections: usize,
}

/// A checked-out connection. Dereferences to [`Client`] so callers use it
/// exactly like a standalone connection; returning it to the pool is
/// either explicit via [`Self::release`] or implicit on drop.
pub struct PooledConnection {
    client: Option<Client>,
    idle: Arc<Mutex<Vec<Client>>>,
    shut_down: Arc<AtomicBool>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// Returns the connection to the pool's idle set if it is open, not
    /// mid-transaction, and has no responses outstanding. Otherwise the
    /// connection is dropped; the pool's capacity slot is freed either way.
    /// A no-op push into the idle set after [`Pool::shutdown`] is avoided
    /// by dropping the connection instead.
    pub fn release(mut self) -> Result<()> {
        let client = self.client.take().expect("release called twice");
        if !client.is_idle() {
            return Err(Error::CannotReturnToPool);
        }
        if !self.shut_down.load(Ordering::Acquire) {
            self.idle.lock().unwrap().push(client);
        }
        Ok(())
    }
}

impl Deref for PooledConnection {
    type Target = Client;

    fn deref(&self) -> &Client {
        self.client.as_ref().expect("connection already released")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            if client.is_idle() && !self.shut_down.load(Ordering::Acquire) {
                self.idle.lock().unwrap().push(client);
            }
        }
    }
}
