//! Liveness endpoint for uptime pingers
//!
//! A deliberately small HTTP/1.1 responder: one request per connection,
//! `GET /health` answers `ok`, `GET /status` returns the engine's latest
//! status snapshot as JSON. It only ever reads the snapshot channel and
//! never waits on the engine.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use watcher::EngineStatus;

/// Largest request head we read before answering
const MAX_REQUEST_BYTES: u64 = 8 * 1024;

/// Time a client gets to send its request head
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A rendered HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// HEAD requests get headers only
    pub head_only: bool,
}

impl Response {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.to_string(),
            head_only: false,
        }
    }

    fn json(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body,
            head_only: false,
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    /// Serialize status line, headers and (unless HEAD) body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        );
        if self.status == 405 {
            out.push_str("Allow: GET, HEAD\r\n");
        }
        out.push_str("\r\n");
        if !self.head_only {
            out.push_str(&self.body);
        }
        out.into_bytes()
    }
}

/// Pick a response for a request line such as `GET /health HTTP/1.1`
pub fn route(request_line: Option<&str>, status: &watch::Receiver<EngineStatus>) -> Response {
    let mut parts = request_line.unwrap_or_default().split_whitespace();
    let (method, target) = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => (method, target),
        _ => return Response::text(400, "bad request"),
    };
    let path = target.split('?').next().unwrap_or(target);
    let head_only = method == "HEAD";

    let mut response = match (method, path) {
        ("GET" | "HEAD", "/health") => Response::text(200, "ok"),
        ("GET" | "HEAD", "/status") => {
            let snapshot = status.borrow().clone();
            match serde_json::to_string(&snapshot) {
                Ok(body) => Response::json(body),
                Err(e) => Response::text(500, &e.to_string()),
            }
        }
        (_, "/health" | "/status") => Response::text(405, "method not allowed"),
        _ => Response::text(404, "not found"),
    };
    response.head_only = head_only;
    response
}

/// Listening health endpoint
pub struct HealthServer {
    listener: TcpListener,
}

impl HealthServer {
    /// Bind the listening socket; fails fast if the port is taken
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one task per connection
    pub async fn serve(self, status: watch::Receiver<EngineStatus>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("Health endpoint listening on http://{}/health", addr);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let status = status.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, status).await {
                            debug!("Health connection from {} failed: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    // Usually fd exhaustion; give it a moment instead of spinning
                    warn!("Failed to accept health connection: {}", e);
                    sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    status: watch::Receiver<EngineStatus>,
) -> io::Result<()> {
    let (read_half, mut write_half) = stream.split();
    let mut reader = BufReader::new(read_half.take(MAX_REQUEST_BYTES));

    let request_line = match timeout(READ_TIMEOUT, read_request_head(&mut reader)).await {
        Ok(result) => result?,
        Err(_) => return Ok(()),
    };

    let response = route(request_line.as_deref(), &status);
    write_half.write_all(&response.to_bytes()).await?;
    write_half.shutdown().await
}

/// Read the request line and skip the headers
async fn read_request_head<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(None);
    }

    let mut header = String::new();
    loop {
        header.clear();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    Ok(Some(request_line))
}
