use super::message::{ReceiveWaiter, Submission, TransactionQueueEntry, ValueSender};
use super::state::ConnectionState;
use crate::network::{eof_error, MessageStream};
use crate::resp::{Command, Value};
use crate::{Error, Result};
use futures_channel::mpsc;
use futures_util::StreamExt;
use log::{debug, error, warn};
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncWrite};

/// The connection state machine — the component that
/// earns its keep. Owns a single [`MessageStream`], the FIFO `receive_queue`
/// of outstanding waiters, the transaction bookkeeping (`transaction_queue`,
/// the generation counters, the doomed-generation cause), and runs as its
/// own task: one [`NetworkHandler`] per connection, single-producer for
/// sends (every clone of the owning `Client` feeds the same mailbox),
/// single-consumer for receives.
pub(crate) struct NetworkHandler<S> {
    stream: MessageStream<S>,
    tag: String,
    receive_queue: VecDeque<ReceiveWaiter>,
    transaction_queue: VecDeque<TransactionQueueEntry>,
    pending_writes: VecDeque<Command>,
    transaction_generation: u64,
    completed_generation: u64,
    in_transaction: bool,
    /// Set the moment a queuing waiter sees anything but `+QUEUED`; every
    /// later queuing waiter and the terminal `EXEC` waiter of the same
    /// generation fail with this same cause.
    doomed: Option<(u64, Error)>,
    closed: bool,
    state: ConnectionState,
}

impl<S> NetworkHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Spawns the state machine as its own task. Returns the mailbox
    /// callers submit [`Command`]s through and the shared [`ConnectionState`]
    /// a [`super::Client`]/[`super::Pool`] can poll without round-tripping a
    /// command.
    pub fn spawn(stream: S, tag: String) -> (mpsc::UnboundedSender<Submission>, ConnectionState) {
        let (sender, receiver) = mpsc::unbounded();
        let state = ConnectionState::new();

        let handler = NetworkHandler {
            stream: MessageStream::new(stream),
            tag,
            receive_queue: VecDeque::new(),
            transaction_queue: VecDeque::new(),
            pending_writes: VecDeque::new(),
            transaction_generation: 0,
            completed_generation: 0,
            in_transaction: false,
            doomed: None,
            closed: false,
            state: state.clone(),
        };

        tokio::spawn(handler.run(receiver));

        (sender, state)
    }

    async fn run(mut self, mut submissions: mpsc::UnboundedReceiver<Submission>) {
        let mut submissions_open = true;

        loop {
            if self.receive_queue.is_empty() {
                if !submissions_open {
                    break;
                }
                match submissions.next().await {
                    Some(submission) => {
                        self.handle_submission(submission);
                        submissions_open = self.drain_and_flush(&mut submissions).await;
                    }
                    None => submissions_open = false,
                }
            } else if !submissions_open {
                let response = self.stream.receive().await;
                if self.handle_response(response).await.is_err() {
                    break;
                }
            } else {
                tokio::select! {
                    submission = submissions.next() => {
                        match submission {
                            Some(submission) => {
                                self.handle_submission(submission);
                                submissions_open = self.drain_and_flush(&mut submissions).await;
                            }
                            None => submissions_open = false,
                        }
                    }
                    response = self.stream.receive() => {
                        if self.handle_response(response).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        self.close(Error::ConnectionClosed);
        debug!("[{}] network loop ended", self.tag);
    }

    /// Records a submission's effect on the transaction state and queues
    /// its waiter, without touching the wire. Writing is batched by
    /// [`Self::drain_and_flush`] so a burst of synchronously-submitted
    /// commands shares one flush.
    fn handle_submission(&mut self, submission: Submission) {
        let Submission { command, sender } = submission;

        if self.closed {
            respond(sender, Err(Error::ConnectionClosed));
            return;
        }

        match command.name {
            "MULTI" if !self.in_transaction => {
                self.set_in_transaction(true);
                self.transaction_generation += 1;
                let generation = self.transaction_generation;
                self.pending_writes.push_back(command);
                self.receive_queue.push_back(ReceiveWaiter::Plain {
                    sender,
                    opens_generation: Some(generation),
                });
            }
            "EXEC" if self.in_transaction => {
                let generation = self.transaction_generation;
                self.set_in_transaction(false);
                self.pending_writes.push_back(command);
                self.receive_queue
                    .push_back(ReceiveWaiter::Exec { generation, sender });
            }
            "DISCARD" if self.in_transaction => {
                let generation = self.transaction_generation;
                self.set_in_transaction(false);
                self.pending_writes.push_back(command);
                self.receive_queue
                    .push_back(ReceiveWaiter::Discard { generation, sender });
            }
            _ if self.in_transaction => {
                let generation = self.transaction_generation;
                self.pending_writes.push_back(command);
                self.receive_queue
                    .push_back(ReceiveWaiter::Queuing { generation });
                self.transaction_queue
                    .push_back(TransactionQueueEntry { generation, sender });
            }
            _ => {
                self.pending_writes.push_back(command);
                self.receive_queue.push_back(ReceiveWaiter::Plain {
                    sender,
                    opens_generation: None,
                });
            }
        }
        self.sync_pending();
    }

    fn set_in_transaction(&mut self, value: bool) {
        self.in_transaction = value;
        self.state.set_in_transaction(value);
    }

    fn sync_pending(&self) {
        self.state.set_pending_count(self.receive_queue.len());
    }

    /// Drains every submission already waiting in the mailbox (without
    /// suspending) before issuing one flush, so N commands submitted back
    /// to back in one executor tick become N wire commands and one flush.
    /// Returns whether the mailbox is still open.
    async fn drain_and_flush(&mut self, submissions: &mut mpsc::UnboundedReceiver<Submission>) -> bool {
        let mut open = true;
        loop {
            match submissions.try_next() {
                Ok(Some(submission)) => self.handle_submission(submission),
                Ok(None) => {
                    open = false;
                    break;
                }
                Err(_) => break, // mailbox empty but still open
            }
        }
        self.flush_pending().await;
        open
    }

    async fn flush_pending(&mut self) {
        if self.pending_writes.is_empty() {
            return;
        }
        let commands: Vec<Command> = self.pending_writes.drain(..).collect();
        if let Err(e) = self.stream.send_batch(commands).await {
            error!("[{}] write failed: {e}", self.tag);
            self.close(e);
        }
    }

    async fn handle_response(&mut self, response: Option<Result<Value>>) -> std::result::Result<(), ()> {
        match response {
            None => {
                self.close(eof_error());
                Err(())
            }
            Some(Err(e)) => {
                error!("[{}] transport/parse error: {e}", self.tag);
                self.close(e);
                Err(())
            }
            Some(Ok(value)) => {
                self.dispatch(value);
                if self.closed {
                    Err(())
                } else {
                    Ok(())
                }
            }
        }
    }

    fn dispatch(&mut self, value: Value) {
        let Some(waiter) = self.receive_queue.pop_front() else {
            warn!("[{}] received response with no outstanding waiter: {value}", self.tag);
            return;
        };
        self.sync_pending();

        match waiter {
            ReceiveWaiter::Plain {
                sender,
                opens_generation,
            } => {
                if let Some(cause) = value.as_error() {
                    if let Some(generation) = opens_generation {
                        self.doom(generation, cause.clone());
                    }
                    respond(sender, Err(cause));
                } else {
                    respond(sender, Ok(value));
                }
            }
            ReceiveWaiter::Queuing { generation } => self.handle_queuing(generation, value),
            ReceiveWaiter::Exec { generation, sender } => self.handle_exec(generation, sender, value),
            ReceiveWaiter::Discard { generation, sender } => {
                self.handle_discard(generation, sender, value)
            }
        }
    }

    fn handle_queuing(&mut self, generation: u64, value: Value) {
        if let Some((doomed_generation, cause)) = self.doomed.clone() {
            if doomed_generation == generation {
                self.fail_next_transaction_entry(
                    generation,
                    Error::TransactionAborted(Box::new(cause)),
                );
                return;
            }
        }

        if value.is_queued() {
            return; // its result waiter stays pending, resolved by EXEC
        }

        let cause = value
            .as_error()
            .unwrap_or_else(|| Error::UnexpectedResponse(format!("expected +QUEUED, got {value:?}")));
        self.fail_next_transaction_entry(generation, Error::TransactionAborted(Box::new(cause.clone())));
        self.doomed = Some((generation, cause));
    }

    fn fail_next_transaction_entry(&mut self, generation: u64, cause: Error) {
        if let Some(entry) = self.transaction_queue.pop_front() {
            debug_assert_eq!(entry.generation, generation);
            respond(entry.sender, Err(cause));
        }
    }

    fn handle_exec(&mut self, generation: u64, sender: Option<ValueSender>, value: Value) {
        if let Some((doomed_generation, cause)) = self.doomed.take() {
            if doomed_generation == generation {
                self.completed_generation = generation;
                respond(sender, Err(Error::TransactionAborted(Box::new(cause))));
                return;
            }
            self.doomed = Some((doomed_generation, cause));
        }

        self.completed_generation = generation;

        match value {
            Value::NilArray => {
                // A watched key changed before EXEC. Every queued
                // command's result waiter fails with `TransactionFailed`,
                // but EXEC's own future resolves with `Nil` rather than
                // an error.
                self.drain_transaction_queue(generation, |_| Error::TransactionFailed);
                respond(sender, Ok(Value::Nil));
            }
            Value::Array(items) => {
                let expected = self.count_transaction_entries(generation);
                if items.len() != expected {
                    let cause = Error::FramingMismatch;
                    self.drain_transaction_queue(generation, |_| cause.clone());
                    respond(sender, Err(cause.clone()));
                    self.close(cause);
                    return;
                }
                let combined = Value::Array(items.clone());
                for item in items {
                    if let Some(entry) = self.transaction_queue.pop_front() {
                        respond(entry.sender, Ok(item));
                    }
                }
                respond(sender, Ok(combined));
            }
            Value::Error(code, message) => {
                let cause = Error::Server { code, message };
                self.drain_transaction_queue(generation, |_| cause.clone());
                respond(sender, Err(cause));
            }
            other => {
                let cause = Error::UnexpectedResponse(format!("unexpected EXEC response: {other:?}"));
                self.drain_transaction_queue(generation, |_| cause.clone());
                respond(sender, Err(cause));
            }
        }
    }

    fn handle_discard(&mut self, generation: u64, sender: Option<ValueSender>, value: Value) {
        self.completed_generation = generation;
        if let Some(cause) = value.as_error() {
            respond(sender, Err(cause));
            return;
        }
        self.drain_transaction_queue(generation, |_| Error::TransactionDiscarded);
        respond(sender, Ok(value));
    }

    fn count_transaction_entries(&self, generation: u64) -> usize {
        self.transaction_queue
            .iter()
            .take_while(|entry| entry.generation == generation)
            .count()
    }

    fn drain_transaction_queue(&mut self, generation: u64, cause: impl Fn(&TransactionQueueEntry) -> Error) {
        while let Some(front) = self.transaction_queue.front() {
            if front.generation != generation {
                break;
            }
            let entry = self.transaction_queue.pop_front().unwrap();
            let err = cause(&entry);
            respond(entry.sender, Err(err));
        }
    }

    fn doom(&mut self, generation: u64, cause: Error) {
        if self.doomed.is_none() {
            self.doomed = Some((generation, cause));
        }
    }

    /// Close propagation: marks the connection closed,
    /// fails every waiter in `receive_queue` and `transaction_queue` with
    /// `cause`, and is idempotent.
    fn close(&mut self, cause: Error) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state.mark_closed();
        self.in_transaction = false;
        self.state.set_in_transaction(false);
        self.doomed = None;

        while let Some(waiter) = self.receive_queue.pop_front() {
            match waiter {
                ReceiveWaiter::Plain { sender, .. } => respond(sender, Err(cause.clone())),
                ReceiveWaiter::Queuing { .. } => {}
                ReceiveWaiter::Exec { sender, .. } | ReceiveWaiter::Discard { sender, .. } => {
                    respond(sender, Err(cause.clone()))
                }
            }
        }
        self.sync_pending();

        while let Some(entry) = self.transaction_queue.pop_front() {
            respond(entry.sender, Err(cause.clone()));
        }
    }
}

fn respond(sender: Option<ValueSender>, result: Result<Value>) {
    if let Some(sender) = sender {
        let _ = sender.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_channel::oneshot;
    use tokio::io::DuplexStream;

    fn handler() -> NetworkHandler<DuplexStream> {
        let (io, _peer) = tokio::io::duplex(64);
        NetworkHandler {
            stream: MessageStream::new(io),
            tag: "test".to_string(),
            receive_queue: VecDeque::new(),
            transaction_queue: VecDeque::new(),
            pending_writes: VecDeque::new(),
            transaction_generation: 0,
            completed_generation: 0,
            in_transaction: false,
            doomed: None,
            closed: false,
            state: ConnectionState::new(),
        }
    }

    fn waiter_pair() -> (oneshot::Receiver<Result<Value>>, Option<ValueSender>) {
        let (tx, rx) = oneshot::channel();
        (rx, Some(tx))
    }

    #[test]
    fn plain_waiter_surfaces_server_error_instead_of_unexpected_response() {
        let mut h = handler();
        let (rx, sender) = waiter_pair();
        h.receive_queue.push_back(ReceiveWaiter::Plain {
            sender,
            opens_generation: None,
        });

        h.dispatch(Value::Error("WRONGTYPE".to_string(), "bad type".to_string()));

        match rx.try_recv() {
            Ok(Some(Err(Error::Server { code, message }))) => {
                assert_eq!(code, "WRONGTYPE");
                assert_eq!(message, "bad type");
            }
            other => panic!("expected Err(Error::Server), got {other:?}"),
        }
    }

    #[test]
    fn plain_waiter_resolves_ok_for_non_error_values() {
        let mut h = handler();
        let (rx, sender) = waiter_pair();
        h.receive_queue.push_back(ReceiveWaiter::Plain {
            sender,
            opens_generation: None,
        });

        h.dispatch(Value::ok());

        match rx.try_recv() {
            Ok(Some(Ok(value))) => assert!(value.is_ok()),
            other => panic!("expected Ok(Value::ok()), got {other:?}"),
        }
    }

    #[test]
    fn multi_refused_dooms_the_generation_it_opened() {
        let mut h = handler();
        let (rx, sender) = waiter_pair();
        h.receive_queue.push_back(ReceiveWaiter::Plain {
            sender,
            opens_generation: Some(1),
        });

        h.dispatch(Value::Error("ERR".to_string(), "MULTI calls can not be nested".to_string()));

        assert!(rx.try_recv().unwrap().unwrap().is_err());
        assert!(matches!(h.doomed, Some((1, _))));
    }

    #[test]
    fn queuing_failure_dooms_triggering_entry_with_transaction_aborted() {
        let mut h = handler();
        let (rx, sender) = waiter_pair();
        h.transaction_queue
            .push_back(TransactionQueueEntry { generation: 1, sender });

        h.handle_queuing(1, Value::Error("ERR".to_string(), "unknown command".to_string()));

        match rx.try_recv() {
            Ok(Some(Err(Error::TransactionAborted(cause)))) => match *cause {
                Error::Server { code, .. } => assert_eq!(code, "ERR"),
                other => panic!("expected Error::Server cause, got {other:?}"),
            },
            other => panic!("expected Err(Error::TransactionAborted), got {other:?}"),
        }
        assert!(matches!(h.doomed, Some((1, _))));
    }

    #[test]
    fn queuing_success_leaves_entry_pending_for_exec() {
        let mut h = handler();
        let (rx, sender) = waiter_pair();
        h.transaction_queue
            .push_back(TransactionQueueEntry { generation: 1, sender });

        h.handle_queuing(1, Value::ok());

        assert!(h.doomed.is_none());
        assert!(rx.try_recv().unwrap().is_none());
    }

    #[test]
    fn subsequent_queuing_waiters_of_a_doomed_generation_also_abort() {
        let mut h = handler();
        let (rx_a, sender_a) = waiter_pair();
        let (rx_b, sender_b) = waiter_pair();
        h.transaction_queue.push_back(TransactionQueueEntry {
            generation: 1,
            sender: sender_a,
        });
        h.transaction_queue.push_back(TransactionQueueEntry {
            generation: 1,
            sender: sender_b,
        });

        h.handle_queuing(1, Value::Error("ERR".to_string(), "boom".to_string()));
        h.handle_queuing(1, Value::ok());

        assert!(matches!(
            rx_a.try_recv(),
            Ok(Some(Err(Error::TransactionAborted(_))))
        ));
        assert!(matches!(
            rx_b.try_recv(),
            Ok(Some(Err(Error::TransactionAborted(_))))
        ));
    }

    #[test]
    fn exec_nil_array_fails_queued_entries_but_resolves_nil() {
        let mut h = handler();
        let (rx_entry, sender_entry) = waiter_pair();
        let (rx_exec, sender_exec) = waiter_pair();
        h.transaction_queue.push_back(TransactionQueueEntry {
            generation: 1,
            sender: sender_entry,
        });

        h.handle_exec(1, sender_exec, Value::NilArray);

        assert!(matches!(
            rx_entry.try_recv(),
            Ok(Some(Err(Error::TransactionFailed)))
        ));
        match rx_exec.try_recv() {
            Ok(Some(Ok(Value::Nil))) => (),
            other => panic!("expected Ok(Value::Nil), got {other:?}"),
        }
    }

    #[test]
    fn close_fails_every_outstanding_waiter_and_is_idempotent() {
        let mut h = handler();
        let (rx_plain, sender_plain) = waiter_pair();
        let (rx_entry, sender_entry) = waiter_pair();
        h.receive_queue.push_back(ReceiveWaiter::Plain {
            sender: sender_plain,
            opens_generation: None,
        });
        h.transaction_queue.push_back(TransactionQueueEntry {
            generation: 1,
            sender: sender_entry,
        });

        h.close(Error::ConnectionClosed);
        h.close(Error::UnexpectedResponse("should be ignored".to_string()));

        assert!(matches!(rx_plain.try_recv(), Ok(Some(Err(Error::ConnectionClosed)))));
        assert!(matches!(rx_entry.try_recv(), Ok(Some(Err(Error::ConnectionClosed)))));
        assert!(h.closed);
        assert!(h.state.is_closed());
    }
}
