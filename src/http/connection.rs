use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::config::TimeoutConfig;
use crate::http::parser::{parse_header_line, parse_request_line};
use crate::http::request::{Request, Version};
use crate::http::response::StatusCode;
use crate::http::writer::{write_status_only, ResponseWriter};
use crate::responder::Responder;

/// Longest request or header line accepted, terminator included.
pub const MAX_LINE: usize = 8 * 1024;
/// Most header lines read before the request is refused.
pub const MAX_HEADERS: usize = 100;

pub type ConnId = u64;

/// A client connection together with its read buffer.
///
/// Whoever holds the value owns the connection: the scheduler while it is
/// parked, a worker while a request is being served. Bytes the reader has
/// already pulled off the socket travel with it.
pub struct Connection {
    id: ConnId,
    peer: SocketAddr,
    reader: BufReader<TcpStream>,
    served: u32,
}

/// Result of reading one line off the connection.
#[derive(Debug, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    Eof,
    TimedOut,
    TooLong,
}

/// What the state machine decided about the connection after one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Closed,
    ReuseEligible,
}

impl Connection {
    pub fn new(id: ConnId, stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            id,
            peer,
            reader: BufReader::new(stream),
            served: 0,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Number of responses written on this connection so far.
    pub fn served(&self) -> u32 {
        self.served
    }

    /// True if request bytes are already sitting in the read buffer.
    pub fn has_buffered(&self) -> bool {
        !self.reader.buffer().is_empty()
    }

    /// Ready once the peer has sent something (or closed, or errored).
    ///
    /// Peeking instead of polling read readiness clears readiness left over
    /// from the previous request, so a parked connection is only reported
    /// when there really is a byte (or EOF) to read.
    pub fn poll_peek_ready(&self, cx: &mut Context<'_>) -> Poll<()> {
        if self.has_buffered() {
            return Poll::Ready(());
        }

        let mut byte = [0u8; 1];
        let mut buf = ReadBuf::new(&mut byte);
        match self.reader.get_ref().poll_peek(cx, &mut buf) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }

    /// Reads one line of at most `limit` bytes, waiting no longer than `wait`.
    pub async fn read_line(&mut self, limit: usize, wait: Duration) -> anyhow::Result<LineRead> {
        let mut buf = Vec::new();
        let mut limited = (&mut self.reader).take(limit as u64);

        let n = match timeout(wait, limited.read_until(b'\n', &mut buf)).await {
            Err(_) => return Ok(LineRead::TimedOut),
            Ok(res) => res?,
        };

        if n == 0 {
            return Ok(LineRead::Eof);
        }

        if !buf.ends_with(b"\n") && n >= limit {
            return Ok(LineRead::TooLong);
        }

        Ok(LineRead::Line(String::from_utf8_lossy(&buf).into_owned()))
    }

    pub fn stream_mut(&mut self) -> &mut BufReader<TcpStream> {
        &mut self.reader
    }

    /// Closes the connection. Consuming `self` makes a second close
    /// impossible.
    pub fn close(self) {
        trace!(conn = self.id, peer = %self.peer, "Closing connection");
    }
}

/// Per-exchange read deadlines.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Wait for the request line on a fresh connection.
    pub first_byte: Duration,
    /// Wait for each header line.
    pub header: Duration,
    /// Wait for the request line on a reused connection.
    pub keep_alive: Duration,
}

impl From<&TimeoutConfig> for Timeouts {
    fn from(cfg: &TimeoutConfig) -> Self {
        Self {
            first_byte: cfg.first_byte(),
            header: cfg.header(),
            keep_alive: cfg.keep_alive(),
        }
    }
}

enum Headers {
    Complete(Vec<(String, String)>),
    Abandoned,
}

/// The request state machine: one request in, one response out, and a
/// verdict on whether the connection may be reused.
pub struct HttpHandler {
    responder: Arc<dyn Responder>,
    timeouts: Timeouts,
}

impl HttpHandler {
    pub fn new(responder: Arc<dyn Responder>, timeouts: Timeouts) -> Self {
        Self { responder, timeouts }
    }

    /// Serves exactly one request on `conn`.
    ///
    /// Protocol problems (timeouts, malformed lines, unsupported versions)
    /// are answered here and end in `Outcome::Closed`. Transport errors are
    /// returned; the caller closes the connection.
    pub async fn serve_once(&self, conn: &mut Connection) -> anyhow::Result<Outcome> {
        let wait = if conn.served == 0 {
            self.timeouts.first_byte
        } else {
            self.timeouts.keep_alive
        };

        let line = match conn.read_line(MAX_LINE, wait).await? {
            LineRead::Line(line) => line,
            LineRead::Eof => {
                debug!(conn = conn.id, "Peer closed before sending a request");
                return Ok(Outcome::Closed);
            }
            LineRead::TimedOut => {
                debug!(conn = conn.id, "Timed out waiting for request line");
                self.fail(conn, Version::HTTP_10, StatusCode::RequestTimeout).await;
                return Ok(Outcome::Closed);
            }
            LineRead::TooLong => {
                warn!(conn = conn.id, "Request line too long");
                self.fail(conn, Version::HTTP_10, StatusCode::BadRequest).await;
                return Ok(Outcome::Closed);
            }
        };

        let request_line = match parse_request_line(&line) {
            Ok(request_line) => request_line,
            Err(e) => {
                warn!(conn = conn.id, line = %line.trim_end(), error = ?e, "Bad request");
                self.fail(conn, Version::HTTP_10, StatusCode::BadRequest).await;
                return Ok(Outcome::Closed);
            }
        };

        let framing = if request_line.version.is_supported() {
            request_line.version
        } else {
            Version::HTTP_10
        };

        let headers = match self.read_headers(conn, framing).await? {
            Headers::Complete(headers) => headers,
            Headers::Abandoned => return Ok(Outcome::Closed),
        };

        if !request_line.version.is_supported() {
            warn!(conn = conn.id, version = %request_line.version, "Version not implemented");
            self.fail(conn, Version::HTTP_10, StatusCode::VersionNotImplemented)
                .await;
            return Ok(Outcome::Closed);
        }

        let request = Request::new(request_line, headers);

        // Responders may touch the filesystem; keep that off the runtime
        // threads.
        let responder = Arc::clone(&self.responder);
        let path = request.path.clone();
        let response = tokio::task::spawn_blocking(move || responder.resolve(&path))
            .await
            .context("responder failed")?;

        let writer = ResponseWriter::new(
            request.version,
            &response,
            !request.method.suppresses_body(),
        );
        writer.write_to(conn.stream_mut()).await?;
        conn.served += 1;

        info!(
            conn = conn.id,
            peer = %conn.peer,
            method = ?request.method,
            path = %request.path,
            version = %request.version,
            status = response.status.as_u16(),
            bytes = writer.body_len(),
            "Served request"
        );

        if request.keep_alive() {
            Ok(Outcome::ReuseEligible)
        } else {
            Ok(Outcome::Closed)
        }
    }

    async fn read_headers(
        &self,
        conn: &mut Connection,
        framing: Version,
    ) -> anyhow::Result<Headers> {
        let mut headers = Vec::new();

        loop {
            let line = match conn.read_line(MAX_LINE, self.timeouts.header).await? {
                LineRead::Line(line) => line,
                LineRead::Eof => {
                    debug!(conn = conn.id, "Peer closed while sending headers");
                    return Ok(Headers::Abandoned);
                }
                LineRead::TimedOut => {
                    debug!(conn = conn.id, "Timed out waiting for headers");
                    self.fail(conn, framing, StatusCode::RequestTimeout).await;
                    return Ok(Headers::Abandoned);
                }
                LineRead::TooLong => {
                    warn!(conn = conn.id, "Header line too long");
                    self.fail(conn, framing, StatusCode::BadRequest).await;
                    return Ok(Headers::Abandoned);
                }
            };

            if line.trim_end_matches(['\r', '\n']).is_empty() {
                return Ok(Headers::Complete(headers));
            }

            if headers.len() >= MAX_HEADERS {
                warn!(conn = conn.id, "Too many header lines");
                self.fail(conn, framing, StatusCode::BadRequest).await;
                return Ok(Headers::Abandoned);
            }

            match parse_header_line(&line) {
                Some(header) => headers.push(header),
                None => trace!(conn = conn.id, line = %line.trim_end(), "Skipping header line"),
            }
        }
    }

    /// Best-effort status line; the connection is closed afterwards either
    /// way.
    async fn fail(&self, conn: &mut Connection, version: Version, status: StatusCode) {
        if let Err(e) = write_status_only(conn.stream_mut(), version, status).await {
            debug!(conn = conn.id, error = %e, "Could not write error status");
        }
    }
}
