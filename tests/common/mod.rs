//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use relay_gateway::{CredentialPool, GatewayConfig, HttpServer};

/// Gateway config suitable for tests: loopback, no proxies, no metrics.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.system_proxy = false;
    config.observability.metrics_enabled = false;
    config
}

/// Stops a gateway started by [`start_gateway`].
pub struct StopHandle(oneshot::Sender<()>);

impl StopHandle {
    pub fn trigger(self) {
        let _ = self.0.send(());
    }
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig, pool: CredentialPool) -> (SocketAddr, StopHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, pool).unwrap();
    let (stop, stopped) = oneshot::channel();

    tokio::spawn(async move {
        let _ = server
            .run(listener, async {
                let _ = stopped.await;
            })
            .await;
    });

    (addr, StopHandle(stop))
}

/// Serve an axum router as a mock origin on an ephemeral port.
pub async fn start_origin(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Client that never pools or proxies, so every request is observable.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a raw origin that sends `chunks` chunked-encoding frames of 1 KiB,
/// one per `interval`, on a single connection.
///
/// The receiver yields how many frames were written before the peer closed
/// the connection (or `chunks` if the body completed).
pub async fn start_dribbling_origin(
    chunks: usize,
    interval: Duration,
) -> (SocketAddr, oneshot::Receiver<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let sent = dribble(&mut socket, chunks, interval).await;
            let _ = tx.send(sent);
        }
    });

    (addr, rx)
}

async fn dribble(socket: &mut TcpStream, chunks: usize, interval: Duration) -> usize {
    let mut buf = vec![0u8; 4096];
    let mut head = Vec::new();
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return 0,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }

    let response_head = "HTTP/1.1 200 OK\r\n\
        Content-Type: application/octet-stream\r\n\
        Transfer-Encoding: chunked\r\n\r\n";
    if socket.write_all(response_head.as_bytes()).await.is_err() {
        return 0;
    }

    let payload = [b'x'; 1024];
    for sent in 0..chunks {
        let mut frame = format!("{:x}\r\n", payload.len()).into_bytes();
        frame.extend_from_slice(&payload);
        frame.extend_from_slice(b"\r\n");
        if socket.write_all(&frame).await.is_err() {
            return sent;
        }

        tokio::select! {
            read = socket.read(&mut buf) => match read {
                Ok(0) | Err(_) => return sent + 1,
                Ok(_) => {}
            },
            _ = tokio::time::sleep(interval) => {}
        }
    }

    let _ = socket.write_all(b"0\r\n\r\n").await;
    chunks
}
