use std::{fmt, io};

/// The error type returned by every fallible operation in this crate.
///
/// Transport errors are fatal to the whole connection; server and parse
/// errors are local to the command that triggered them; transaction and
/// lifecycle errors describe misuse or server-side transaction outcomes.
#[derive(Debug, Clone)]
pub enum Error {
    /// The underlying byte stream failed (read, write, or EOF mid-frame).
    Io(String),
    /// The decoder hit a malformed RESP frame (bad prefix, bad length, ...).
    Parse(String),
    /// The server replied with a RESP error (`-ERR ...`, `-WRONGTYPE ...`, ...).
    ///
    /// Never closes the connection on its own.
    Server { code: String, message: String },
    /// A response did not have the shape a typed parser expected.
    UnexpectedResponse(String),
    /// `EXEC` returned a duplicate-key map where uniqueness was required.
    DuplicateField(String),
    /// `EXEC` returned `NilArray`: a watched key changed before `EXEC`.
    TransactionFailed,
    /// The transaction was closed with `DISCARD`.
    TransactionDiscarded,
    /// A queuing waiter saw something other than `+QUEUED`; every later
    /// queuing waiter and the terminal `EXEC` waiter of the same
    /// generation fail with this same cause.
    TransactionAborted(Box<Error>),
    /// `EXEC`'s array length did not match the number of queued commands.
    /// Fatal: the connection is closed because the state machine has lost
    /// track of which result belongs to which command.
    FramingMismatch,
    /// A submission was made on a connection that already called `close`.
    ConnectionClosed,
    /// A submission was made on a connection currently held by a pool.
    ConnectionInPool,
    /// `Pool::release` was called on a connection that cannot be returned
    /// (it still has outstanding commands, or is mid-transaction).
    CannotReturnToPool,
    /// The response channel for a command was dropped without a reply,
    /// e.g. because the connection closed while the future was still in
    /// flight and nothing else produced a more specific cause.
    Canceled,
    /// A command (or connect) exceeded its configured timeout.
    Timeout,
    /// A catch-all for client-side misuse not covered above.
    Client(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "I/O error: {msg}"),
            Error::Parse(msg) => write!(f, "RESP parse error: {msg}"),
            Error::Server { code, message } => write!(f, "{code} {message}"),
            Error::UnexpectedResponse(msg) => write!(f, "unexpected response: {msg}"),
            Error::DuplicateField(key) => write!(f, "duplicate field in map response: {key}"),
            Error::TransactionFailed => f.write_str("transaction failed: a watched key changed"),
            Error::TransactionDiscarded => f.write_str("transaction discarded"),
            Error::TransactionAborted(cause) => write!(f, "transaction aborted: {cause}"),
            Error::FramingMismatch => {
                f.write_str("EXEC result count did not match the number of queued commands")
            }
            Error::ConnectionClosed => f.write_str("connection is closed"),
            Error::ConnectionInPool => f.write_str("connection is owned by the pool"),
            Error::CannotReturnToPool => f.write_str("connection cannot be returned to the pool"),
            Error::Canceled => f.write_str("response channel was dropped"),
            Error::Timeout => f.write_str("operation timed out"),
            Error::Client(msg) => write!(f, "client error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<futures_channel::oneshot::Canceled> for Error {
    fn from(_: futures_channel::oneshot::Canceled) -> Self {
        Error::Canceled
    }
}

impl Error {
    /// True for errors that are local to a single command and must not
    /// close the connection.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Server { .. } | Error::UnexpectedResponse(_) | Error::DuplicateField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
