//! Socket Tests
//!
//! Real loopback connections through the system transport:
//! - Refused candidate followed by a listening one
//! - Request/response over the connection handle
//! - Disconnect and non-blocking reads
//! - The async entry point

use dialnet::dns::{DnsResolverWithOverrides, GaiResolver};
use dialnet::{connect_async, ConnectError, ConnectJob, ConnectOptions, FailureReason};

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// An address nothing is listening on.
fn closed_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap()
}

fn resolver_for(host: &'static str, addrs: Vec<SocketAddr>) -> DnsResolverWithOverrides {
    let mut overrides = HashMap::new();
    overrides.insert(Cow::Borrowed(host), addrs);
    DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()), overrides)
}

#[test]
fn test_refused_then_listening() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let live = listener.local_addr().unwrap();
    let dead = closed_addr();

    // Non-numeric service keeps the override ports.
    let resolver = resolver_for("svc.test", vec![dead, live]);
    let mut job = ConnectJob::new(resolver);
    let conn = job.connect("svc.test", "svc").unwrap();

    assert_eq!(conn.endpoint().address(), live);
    assert_eq!(conn.peer_addr().unwrap(), live);
}

#[test]
fn test_all_refused() {
    let (a, b) = (closed_addr(), closed_addr());
    let resolver = resolver_for("down.test", vec![a, b]);

    let err = ConnectJob::new(resolver).connect("down.test", "svc").unwrap_err();
    let ConnectError::Connection(err) = err else {
        panic!("Expected Connection error, got {:?}", err);
    };

    assert_eq!(err.attempt_count(), 2);
    assert_eq!(err.reason(), FailureReason::CannotConnect);
    assert_eq!(err.last().endpoint().address(), b);
    assert!(err.to_string().starts_with("Connection failed after 2 attempt(s): Unable to connect to"));
}

#[test]
fn test_request_response() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf).unwrap();
        assert!(buf[..n].starts_with(b"GET / HTTP/1.1\r\n"));
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
    });

    let mut job = ConnectJob::system();
    let mut conn = job.connect("127.0.0.1", &port.to_string()).unwrap();
    conn.write_all(b"GET / HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n").unwrap();

    let mut response = Vec::new();
    conn.read_to_end(&mut response).unwrap();
    server.join().unwrap();

    assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");
    assert!(!conn.is_connected());
}

#[test]
fn test_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let mut conn = ConnectJob::system().connect("127.0.0.1", &port).unwrap();
    assert!(conn.is_connected());

    conn.disconnect().unwrap();
    assert!(!conn.is_connected());
    conn.disconnect().unwrap();

    let err = conn.write(b"late").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    assert_eq!(conn.read(&mut [0u8; 8]).unwrap(), 0);
}

#[test]
fn test_nonblocking_read_available() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let options = ConnectOptions::new().nonblocking(true);
    let mut job = ConnectJob::with_options(GaiResolver::new(), options);
    let mut conn = job.connect("127.0.0.1", &port).unwrap();
    let (mut peer, _) = listener.accept().unwrap();

    let mut buf = [0u8; 1024];
    assert_eq!(conn.read_available(&mut buf).unwrap(), 0);
    assert!(conn.is_connected());

    peer.write_all(b"ping").unwrap();
    let mut got = 0;
    for _ in 0..50 {
        got = conn.read_available(&mut buf).unwrap();
        if got > 0 {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(&buf[..got], b"ping");
}

#[test]
fn test_attempt_timeout_allows_fast_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let options = ConnectOptions::new()
        .attempt_timeout(Duration::from_secs(5))
        .total_timeout(Duration::from_secs(10));
    let mut job = ConnectJob::with_options(GaiResolver::new(), options);

    assert!(job.connect("127.0.0.1", &port).is_ok());
}

#[tokio::test]
async fn test_connect_async() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let stream = connect_async("127.0.0.1", &addr.port().to_string(), ConnectOptions::default())
        .await
        .unwrap();

    assert_eq!(stream.peer_addr().unwrap(), addr);
    assert!(stream.nodelay().unwrap());
}

#[tokio::test]
async fn test_connect_async_refused() {
    let addr = closed_addr();

    let err = connect_async("127.0.0.1", &addr.port().to_string(), ConnectOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_connection());
    assert_eq!(err.as_i32(), -102);
}
