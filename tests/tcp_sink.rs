//! Integration tests for the socket sink against real sockets.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};
use socksink::{SinkError, SocketHandler, SocketHandlerBuilder};

const LINE: &[u8] = b"level=info msg=\"boot sequence complete\"\n";

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

/// Accept one connection and read `count` whole lines from it, delivering
/// each over a channel.
fn spawn_capture_server(
    listener: TcpListener,
    count: usize,
) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let addr = listener.local_addr().expect("listener has address");
    let (notify_tx, notify_rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        for _ in 0..count {
            let mut payload = vec![0u8; LINE.len()];
            stream.read_exact(&mut payload).expect("read payload");
            notify_tx.send(payload).expect("send payload");
        }
    });
    (addr, notify_rx)
}

fn recv_payload(notify_rx: &mpsc::Receiver<Vec<u8>>, expectation: &str) -> Vec<u8> {
    notify_rx
        .recv_timeout(Duration::from_secs(2))
        .expect(expectation)
}

#[rstest]
fn delivers_payload_over_tcp(tcp_listener: TcpListener) {
    let (addr, notify_rx) = spawn_capture_server(tcp_listener, 1);
    let handler = SocketHandler::new(format!("tcp://{addr}"));
    assert!(!handler.is_connected());

    handler.write(LINE).expect("payload accepted");
    assert!(handler.is_connected());
    assert_eq!(recv_payload(&notify_rx, "payload received"), LINE);

    handler.close();
    assert!(!handler.is_connected());
}

#[rstest]
fn reuses_the_connection_across_writes(tcp_listener: TcpListener) {
    // The server accepts exactly once; a reconnect would hang the second
    // write against a listener that is no longer accepting.
    let (addr, notify_rx) = spawn_capture_server(tcp_listener, 2);
    let handler = SocketHandler::new(format!("tcp://{addr}"));

    handler.write(LINE).expect("first payload accepted");
    handler.write(LINE).expect("second payload accepted");
    assert_eq!(recv_payload(&notify_rx, "first payload"), LINE);
    assert_eq!(recv_payload(&notify_rx, "second payload"), LINE);
}

#[rstest]
fn persistent_handler_survives_close(tcp_listener: TcpListener) {
    let (addr, notify_rx) = spawn_capture_server(tcp_listener, 2);
    let handler = SocketHandlerBuilder::new(format!("tcp://{addr}"))
        .with_persistent(true)
        .build()
        .expect("valid configuration");

    handler.write(LINE).expect("first payload accepted");
    handler.close();
    assert!(handler.is_connected());

    handler.write(LINE).expect("second payload accepted");
    assert_eq!(recv_payload(&notify_rx, "first payload"), LINE);
    assert_eq!(recv_payload(&notify_rx, "second payload"), LINE);
}

#[rstest]
fn connect_failure_is_reported() {
    // Nothing listens on the target; the write must fail fast with the
    // connect classification, leaving the handler disconnected.
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("listener has address");
    drop(listener);

    let handler = SocketHandlerBuilder::new(format!("tcp://{addr}"))
        .with_connection_timeout(0.25)
        .build()
        .expect("valid configuration");
    let err = handler.write(LINE).expect_err("connect must fail");
    assert!(matches!(err, SinkError::ConnectionFailed { .. }));
    assert!(!handler.is_connected());
}

#[cfg(unix)]
#[rstest]
fn delivers_payload_over_unix_socket() {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("sink.sock");
    let listener = UnixListener::bind(&path).expect("bind unix listener");
    let (notify_tx, notify_rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let mut payload = vec![0u8; LINE.len()];
        stream.read_exact(&mut payload).expect("read payload");
        notify_tx.send(payload).expect("send payload");
    });

    let handler = SocketHandler::new(format!("unix://{}", path.display()));
    handler.write(LINE).expect("payload accepted");
    assert!(handler.is_connected());
    assert_eq!(recv_payload(&notify_rx, "payload received"), LINE);

    // The server thread exits after the read, dropping its end; the
    // liveness probe must observe the hangup.
    let deadline = Instant::now() + Duration::from_secs(2);
    while handler.is_connected() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!handler.is_connected());
    handler.close();
}
