use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Renders a response to its wire form.
///
/// The Content-Length written always equals the body length: it is added
/// when missing and corrected when the handler set a different value.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + resp.body.len());
    let body_len = resp.body.len().to_string();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.reason
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    let mut wrote_length = false;
    for (k, v) in &resp.headers {
        let value = if k.eq_ignore_ascii_case("Content-Length") {
            if wrote_length {
                continue;
            }
            wrote_length = true;
            if v.trim() != body_len {
                tracing::warn!(
                    declared = %v,
                    actual = resp.body.len(),
                    "Correcting Content-Length to match body"
                );
            }
            body_len.as_str()
        } else {
            v.as_str()
        };
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    if !wrote_length {
        buf.extend_from_slice(b"Content-Length: ");
        buf.extend_from_slice(body_len.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::{ResponseBuilder, StatusCode};

    #[test]
    fn wrong_content_length_is_corrected() {
        let response = ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Length", "999")
            .body(b"test".to_vec())
            .build();

        let raw = String::from_utf8(serialize_response(&response)).unwrap();
        assert!(raw.contains("Content-Length: 4\r\n"));
        assert!(!raw.contains("999"));
    }
}
