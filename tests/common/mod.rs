//! Shared utilities for integration testing against a mock node.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tx_broadcaster::config::ClientConfig;
use tx_broadcaster::transaction::{HttpTransport, TransactionClient};

/// A request as seen by the mock node.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    /// Lower-cased names.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockRequest {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What the mock node does with a request.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    Http {
        status: u16,
        content_type: &'static str,
        body: String,
    },
    /// Close the connection without answering.
    Hangup,
    /// Send the status line and headers, then close mid-body.
    Truncated { status: u16 },
}

#[allow(dead_code)]
impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Http {
            status,
            content_type: "application/json",
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Http {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }
}

/// Handle on a running mock node.
#[derive(Clone)]
pub struct MockNode {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

#[allow(dead_code)]
impl MockNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path_prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.starts_with(path_prefix))
            .count()
    }
}

/// Start a programmable mock node on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockNode
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        log.lock().unwrap().push(request.clone());

                        match f(request).await {
                            MockResponse::Http {
                                status,
                                content_type,
                                body,
                            } => {
                                let reason = reason_phrase(status);
                                let response_str = format!(
                                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                    status,
                                    reason,
                                    content_type,
                                    body.len(),
                                    body
                                );
                                let _ = socket.write_all(response_str.as_bytes()).await;
                                let _ = socket.shutdown().await;
                                tokio::time::sleep(Duration::from_millis(10)).await;
                            }
                            MockResponse::Hangup => {
                                drop(socket);
                            }
                            MockResponse::Truncated { status } => {
                                let response_str = format!(
                                    "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: 64\r\nConnection: close\r\n\r\npartial",
                                    status,
                                    reason_phrase(status)
                                );
                                let _ = socket.write_all(response_str.as_bytes()).await;
                                let _ = socket.shutdown().await;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockNode { addr, requests }
}

fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

/// Config pointing at `base_url` with test-friendly delays.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.node.base_url = base_url.to_string();
    config.timeouts.request_ms = 2_000;
    config.retries.max_retries = 3;
    config.retries.backoff_base_ms = 20;
    config.polling.interval_ms = 50;
    config.polling.max_wait_ms = 5_000;
    config
}

/// Client over real HTTP, bypassing any proxy from the environment.
pub fn client(config: &ClientConfig) -> TransactionClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    TransactionClient::with_transport(config, Arc::new(HttpTransport::with_client(http))).unwrap()
}
