//! End-to-end scenarios against a stubbed server on a real loopback socket.
//! Each stub server writes a canned byte script and doesn't care what the
//! client sent; these tests only exercise wire decoding, response
//! dispatch, and transaction framing, not two-way protocol negotiation.

use redis_driver::{cmd, Client, Error, Value};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

async fn stub_server(script: &'static [u8]) -> String {
    let _ = env_logger::builder().is_test(true).try_init();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = socket.write_all(script).await;
        let _ = socket.shutdown().await;
    });

    addr.to_string()
}

#[tokio::test]
async fn s1_ping_resolves_to_pong() {
    let addr = stub_server(b"+PONG\r\n").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let reply: String = client.send(cmd("PING")).await.unwrap();
    assert_eq!(reply, "PONG");
}

#[tokio::test]
async fn s2_get_missing_resolves_to_nil() {
    let addr = stub_server(b"$-1\r\n").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let reply: Option<String> = client.send(cmd("GET").arg("missing")).await.unwrap();
    assert_eq!(reply, None);
}

#[tokio::test]
async fn s3_pipelined_commands_resolve_in_submission_order() {
    let addr = stub_server(b"+OK\r\n$1\r\nv\r\n:1\r\n").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let set_fut = client.send::<()>(cmd("SET").arg("k").arg("v"));
    let get_fut = client.send::<Option<String>>(cmd("GET").arg("k"));
    let del_fut = client.send::<i64>(cmd("DEL").arg("k"));

    let (set_result, get_result, del_result) = tokio::join!(set_fut, get_fut, del_fut);
    assert!(set_result.is_ok());
    assert_eq!(get_result.unwrap(), Some("v".to_string()));
    assert_eq!(del_result.unwrap(), 1);
}

#[tokio::test]
async fn s4_transaction_success() {
    let addr = stub_server(b"+OK\r\n+QUEUED\r\n+QUEUED\r\n*2\r\n+OK\r\n:2\r\n").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let mut transaction = client.create_transaction();
    transaction.multi().await.unwrap();
    let set_reply = transaction.queue::<()>(cmd("SET").arg("k").arg("1")).unwrap();
    let incr_reply = transaction.queue::<i64>(cmd("INCR").arg("k")).unwrap();

    let exec_result = transaction.exec().await.unwrap();
    assert_eq!(exec_result, vec![Value::SimpleString("OK".into()), Value::Integer(2)]);

    assert!(set_reply.wait().await.is_ok());
    assert_eq!(incr_reply.wait().await.unwrap(), 2);
}

#[tokio::test]
async fn s5_transaction_watched_key_failure() {
    let addr = stub_server(b"+OK\r\n+QUEUED\r\n*-1\r\n").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let mut transaction = client.create_transaction();
    transaction.multi().await.unwrap();
    let set_reply = transaction.queue::<()>(cmd("SET").arg("k").arg("v")).unwrap();

    let exec_result = transaction.exec().await.unwrap();
    assert!(exec_result.is_empty());

    match set_reply.wait().await {
        Err(Error::TransactionFailed) => (),
        other => panic!("expected TransactionFailed, got {other:?}"),
    }
    assert!(!client.is_closed());
}

#[tokio::test]
async fn transaction_error_mid_queue_dooms_remaining_waiters() {
    let addr = stub_server(b"+OK\r\n-ERR something went wrong\r\n+QUEUED\r\n").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let mut transaction = client.create_transaction();
    transaction.multi().await.unwrap();
    let first = transaction.queue::<()>(cmd("SET").arg("k").arg("v")).unwrap();
    let second = transaction.queue::<()>(cmd("INCR").arg("k")).unwrap();

    match first.wait().await {
        Err(Error::TransactionAborted(cause)) => {
            assert!(matches!(*cause, Error::Server { .. }));
        }
        other => panic!("expected TransactionAborted, got {other:?}"),
    }
    assert!(matches!(second.wait().await, Err(Error::TransactionAborted(_))));
    assert!(!client.is_closed());
}

#[tokio::test]
async fn s6_transport_close_mid_first_response_fails_all_outstanding() {
    // The stub truncates the very first response and closes: neither GET's
    // future ever receives a complete frame, so both fail and the
    // connection ends up closed.
    let addr = stub_server(b"$5\r\npart").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let a = client.send::<Option<String>>(cmd("GET").arg("a"));
    let b = client.send::<Option<String>>(cmd("GET").arg("b"));
    let (a_result, b_result) = tokio::join!(a, b);

    assert!(a_result.is_err());
    assert!(b_result.is_err());

    // Give the network handler task a moment to observe the EOF and mark
    // the connection closed.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(client.is_closed());
}

#[tokio::test]
async fn transport_close_after_one_response_fails_remaining_outstanding() {
    // The stub completes the first response in full, then truncates the
    // second before closing: GET a's future succeeds, GET b's fails, and
    // the connection ends up closed.
    let addr = stub_server(b"$1\r\na\r\n$5\r\npart").await;
    let client = Client::connect(addr.as_str()).await.unwrap();

    let a = client.send::<Option<String>>(cmd("GET").arg("a"));
    let b = client.send::<Option<String>>(cmd("GET").arg("b"));
    let (a_result, b_result) = tokio::join!(a, b);

    assert_eq!(a_result.unwrap(), Some("a".to_string()));
    assert!(b_result.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(client.is_closed());
}
