use crate::resp::{Command, Value};
use crate::Result;
use futures_channel::oneshot;

pub(crate) type ValueSender = oneshot::Sender<Result<Value>>;
pub(crate) type ValueReceiver = oneshot::Receiver<Result<Value>>;

/// What a caller submitted to the connection: a command plus, unless it
/// was sent with `send_and_forget`, the channel its eventual response
/// should land on.
///
/// This is the only message type the network handler's mailbox carries.
/// Transaction framing is not a distinct message kind — it falls entirely
/// out of the state machine recognizing `MULTI`/`EXEC`/`DISCARD` opcodes
/// by name and its own `in_transaction` bookkeeping, rather than a
/// dedicated message variant.
pub(crate) struct Submission {
    pub command: Command,
    pub sender: Option<ValueSender>,
}

impl Submission {
    pub fn new(command: Command, sender: ValueSender) -> Self {
        Self {
            command,
            sender: Some(sender),
        }
    }

    pub fn forget(command: Command) -> Self {
        Self {
            command,
            sender: None,
        }
    }
}

/// A pending response slot, held in FIFO order in the state machine's
/// `receive_queue`; the i-th waiter submitted is resolved by the i-th
/// response received.
pub(crate) enum ReceiveWaiter {
    /// An ordinary command submitted outside of a transaction, or `MULTI`
    /// itself. `opens_generation` is set only for `MULTI`, so its response
    /// can doom the transaction it just opened if the server refuses it
    /// (e.g. `MULTI` nested inside `MULTI`, on a server that forbids it).
    Plain {
        sender: Option<ValueSender>,
        opens_generation: Option<u64>,
    },
    /// The intra-transaction slot expecting the literal `+QUEUED` for one
    /// queued command. Carries no sender of its own — it only decides
    /// whether the transaction stays healthy or becomes doomed.
    Queuing { generation: u64 },
    /// The terminal `EXEC` response for one generation; resolves every
    /// outstanding [`TransactionQueueEntry`] of that generation.
    Exec {
        generation: u64,
        sender: Option<ValueSender>,
    },
    /// The terminal `DISCARD` response for one generation.
    Discard {
        generation: u64,
        sender: Option<ValueSender>,
    },
}

/// A transaction-scoped result waiter, resolved by the matching element
/// of `EXEC`'s response array (or by the transaction's
/// failure/discard/abort outcome).
pub(crate) struct TransactionQueueEntry {
    pub generation: u64,
    pub sender: Option<ValueSender>,
}
