use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// The slice of connection state visible from outside the owning
/// [`super::network_handler::NetworkHandler`] task, shared via `Arc` so a
/// [`super::Client`] and a [`super::Pool`] can make a release-time health
/// check without reaching across the task boundary.
///
/// Every field here is a best-effort snapshot: the network handler updates
/// it synchronously at the points that matter (submission, dispatch,
/// transaction transitions, close), so a reader sees the state as of the
/// last event processed, never a half-updated one.
#[derive(Clone)]
pub(crate) struct ConnectionState {
    closed: Arc<AtomicBool>,
    in_transaction: Arc<AtomicBool>,
    pending: Arc<AtomicUsize>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            closed: Arc::new(AtomicBool::new(false)),
            in_transaction: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::Acquire)
    }

    pub fn set_in_transaction(&self, value: bool) {
        self.in_transaction.store(value, Ordering::Release);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn set_pending_count(&self, value: usize) {
        self.pending.store(value, Ordering::Release);
    }

    /// A connection is poolable only if it is open, not
    /// mid-transaction, and has no outstanding responses in flight.
    pub fn is_idle(&self) -> bool {
        !self.is_closed() && !self.is_in_transaction() && self.pending_count() == 0
    }
}
