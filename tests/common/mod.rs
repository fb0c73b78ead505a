//! Shared utilities for end-to-end tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use http_relay::config::ListenerConfig;
use http_relay::net::{Acceptor, ConnectionTracker};
use http_relay::relay::{DnsConnector, RelayHandler};
use http_relay::wire::Limits;
use http_relay::Shutdown;

/// A keep-alive origin that answers every request with the same bytes.
pub struct MockOrigin {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
    connections: Arc<AtomicUsize>,
}

impl MockOrigin {
    /// Host header value that routes to this origin.
    pub fn host(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }

    /// Raw bytes of every request received so far.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Start a mock origin on an ephemeral loopback port.
pub async fn start_origin(response: &'static [u8]) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let connections = Arc::new(AtomicUsize::new(0));

    let recorded = Arc::clone(&requests);
    let accepted = Arc::clone(&connections);
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let recorded = Arc::clone(&recorded);
            tokio::spawn(serve_origin_connection(socket, response, recorded));
        }
    });

    MockOrigin {
        addr,
        requests,
        connections,
    }
}

async fn serve_origin_connection(
    socket: TcpStream,
    response: &'static [u8],
    recorded: Arc<Mutex<Vec<Vec<u8>>>>,
) {
    let mut reader = BufReader::new(socket);
    loop {
        let mut request = Vec::new();
        loop {
            let start = request.len();
            match reader.read_until(b'\n', &mut request).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            if &request[start..] == b"\r\n" {
                break;
            }
        }

        let head = String::from_utf8_lossy(&request).to_ascii_lowercase();
        if head.contains("transfer-encoding: chunked") {
            while !request.ends_with(b"0\r\n\r\n") {
                let mut byte = [0u8; 1];
                if reader.read_exact(&mut byte).await.is_err() {
                    return;
                }
                request.push(byte[0]);
            }
        } else if let Some(length) = declared_length(&head) {
            let mut body = vec![0u8; length];
            if reader.read_exact(&mut body).await.is_err() {
                return;
            }
            request.extend_from_slice(&body);
        }

        recorded.lock().unwrap().push(request);
        if reader.get_mut().write_all(response).await.is_err() {
            return;
        }
    }
}

fn declared_length(head: &str) -> Option<usize> {
    head.lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse().ok())
}

/// A relay running on an ephemeral loopback port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub tracker: ConnectionTracker,
    pub shutdown: Shutdown,
}

impl RunningRelay {
    /// Wait until no client connections remain, up to two seconds.
    pub async fn wait_idle(&self) -> bool {
        for _ in 0..40 {
            if self.tracker.active_count() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

pub async fn start_relay() -> RunningRelay {
    let config = ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_connections: None,
    };
    let acceptor = Acceptor::bind(&config).await.unwrap();
    let addr = acceptor.local_addr().unwrap();
    let tracker = acceptor.tracker();

    let handler = Arc::new(RelayHandler::new(DnsConnector::default(), Limits::default()));
    let shutdown = Shutdown::new();
    tokio::spawn(acceptor.run(handler, shutdown.subscribe()));

    RunningRelay {
        addr,
        tracker,
        shutdown,
    }
}

/// Write `request` and read back exactly `expected_len` bytes.
pub async fn round_trip(client: &mut TcpStream, request: &[u8], expected_len: usize) -> Vec<u8> {
    client.write_all(request).await.unwrap();
    let mut response = vec![0u8; expected_len];
    tokio::time::timeout(Duration::from_secs(5), client.read_exact(&mut response))
        .await
        .expect("relay did not answer in time")
        .unwrap();
    response
}
