use std::collections::HashMap;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::{Config, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_HEADER_BYTES};
use crate::http::request::{Method, Request};

/// Upper bound for a single body read.
const BODY_CHUNK_SIZE: usize = 8192;

const HEADER_TERMINATOR: &[u8; 4] = b"\r\n\r\n";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty request stream")]
    EmptyStream,
    #[error("stream ended before end of headers")]
    MissingTerminator,
    #[error("header block exceeds {0} bytes")]
    HeadersTooLarge(usize),
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),
    #[error("declared body of {declared} bytes exceeds limit of {limit}")]
    BodyTooLarge { declared: usize, limit: usize },
    #[error("body truncated: expected {expected} bytes, received {received}")]
    TruncatedBody { expected: usize, received: usize },
    #[error("timed out reading request")]
    Timeout,
    #[error("I/O error reading request: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds applied while reading one request.
#[derive(Debug, Clone)]
pub struct ParseLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    pub strict_body_length: bool,
    pub read_timeout: Option<Duration>,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            strict_body_length: false,
            read_timeout: None,
        }
    }
}

impl From<&Config> for ParseLimits {
    fn from(cfg: &Config) -> Self {
        Self {
            max_header_bytes: cfg.http.max_header_bytes,
            max_body_bytes: cfg.http.max_body_bytes,
            strict_body_length: cfg.http.strict_body_length,
            read_timeout: cfg.server.read_timeout(),
        }
    }
}

/// Reads one request from `stream`.
///
/// Bytes are consumed until CRLFCRLF ends the header block. Body bytes that
/// arrived together with the headers are kept; the rest of the declared
/// Content-Length is read in bounded chunks. When the peer closes early the
/// partial body is returned, unless `strict_body_length` is set.
pub async fn read_request<R>(stream: &mut R, limits: &ParseLimits) -> Result<Request, ProtocolError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buffer = BytesMut::with_capacity(4096);
    let mut scanned = 0;

    let headers_end = loop {
        if let Some(pos) = find_headers_end(&buffer, scanned) {
            break pos;
        }
        // The terminator may straddle two reads; rescan the last 3 bytes.
        scanned = buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);

        if buffer.len() > limits.max_header_bytes {
            return Err(ProtocolError::HeadersTooLarge(limits.max_header_bytes));
        }

        let n = read_some(stream, &mut buffer, limits.read_timeout).await?;
        if n == 0 {
            return Err(if buffer.is_empty() {
                ProtocolError::EmptyStream
            } else {
                ProtocolError::MissingTerminator
            });
        }
    };

    if headers_end > limits.max_header_bytes {
        return Err(ProtocolError::HeadersTooLarge(limits.max_header_bytes));
    }

    let head = buffer.split_to(headers_end + HEADER_TERMINATOR.len());
    let mut request = parse_head(&head[..headers_end])?;

    let expected = request.content_length();
    if expected > limits.max_body_bytes {
        return Err(ProtocolError::BodyTooLarge {
            declared: expected,
            limit: limits.max_body_bytes,
        });
    }
    // Grows as bytes arrive; the declared length is not trusted up front.
    let mut body = Vec::with_capacity(expected.min(BODY_CHUNK_SIZE));

    let from_buffer = buffer.len().min(expected);
    body.extend_from_slice(&buffer[..from_buffer]);
    buffer.advance(from_buffer);

    while body.len() < expected {
        let to_read = (expected - body.len()).min(BODY_CHUNK_SIZE);
        buffer.clear();
        buffer.reserve(to_read);

        let mut chunk = (&mut *stream).take(to_read as u64);
        let n = read_some(&mut chunk, &mut buffer, limits.read_timeout).await?;
        if n == 0 {
            if limits.strict_body_length {
                return Err(ProtocolError::TruncatedBody {
                    expected,
                    received: body.len(),
                });
            }
            tracing::warn!(
                expected,
                received = body.len(),
                path = %request.path,
                "Stream closed before full body; keeping partial body"
            );
            break;
        }
        body.extend_from_slice(&buffer[..n]);
    }

    request.body = body;
    Ok(request)
}

async fn read_some<R>(
    stream: &mut R,
    buffer: &mut BytesMut,
    read_timeout: Option<Duration>,
) -> Result<usize, ProtocolError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let n = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, stream.read_buf(buffer))
            .await
            .map_err(|_| ProtocolError::Timeout)??,
        None => stream.read_buf(buffer).await?,
    };
    Ok(n)
}

/// Parses the request line and headers (terminator excluded).
///
/// The returned request has an empty body.
pub fn parse_head(head: &[u8]) -> Result<Request, ProtocolError> {
    let head = std::str::from_utf8(head).map_err(|_| ProtocolError::InvalidEncoding)?;
    let mut lines = head.split("\r\n");

    // Request line: method, path, and an ignored version token
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.splitn(3, ' ');
    let method = parts.next().filter(|s| !s.is_empty());
    let path = parts.next().filter(|s| !s.is_empty());
    let (method, path) = match (method, path) {
        (Some(m), Some(p)) => (m, p),
        _ => return Err(ProtocolError::InvalidRequestLine(request_line.to_string())),
    };
    let version = parts.next().unwrap_or_default().trim();

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => {
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => tracing::debug!(line, "Skipping header line without colon"),
        }
    }

    Ok(Request {
        method: Method::parse(method),
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: Vec::new(),
    })
}

fn find_headers_end(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
        .map(|pos| pos + from)
}
