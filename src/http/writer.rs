use anyhow::bail;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::request::Version;
use crate::http::response::{Body, Response, StatusCode};

fn status_line(version: Version, status: StatusCode) -> String {
    format!(
        "HTTP/{} {} {}\r\n",
        version,
        status.as_u16(),
        status.reason_phrase()
    )
}

/// Status line, headers and the blank line that ends them.
pub fn serialize_head(version: Version, resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(status_line(version, resp.status).as_bytes());

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes the status line for a response the server produces on its own
/// (400, 408, 501). These never carry a body.
pub async fn write_status_only<W>(
    stream: &mut W,
    version: Version,
    status: StatusCode,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = status_line(version, status).into_bytes();
    buf.extend_from_slice(b"\r\n");

    stream.write_all(&buf).await?;
    stream.flush().await
}

pub struct ResponseWriter<'a> {
    head: Vec<u8>,
    body: Option<&'a Body>,
}

impl<'a> ResponseWriter<'a> {
    /// `include_body` is false for HEAD: the head is computed and sent the
    /// same way, the body step is skipped.
    pub fn new(version: Version, response: &'a Response, include_body: bool) -> Self {
        Self {
            head: serialize_head(version, response),
            body: include_body.then_some(&response.body),
        }
    }

    /// Number of body bytes that will be written.
    pub fn body_len(&self) -> u64 {
        self.body.map(Body::len).unwrap_or(0)
    }

    pub async fn write_to<W>(&self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;
        stream.flush().await?;

        match self.body {
            None | Some(Body::Empty) => {}
            Some(Body::Bytes(bytes)) => {
                stream.write_all(bytes).await?;
            }
            Some(Body::File { path, len }) => {
                // Content-Length was fixed when the response was built; never
                // send more, and fail if the file shrank since.
                let file = tokio::fs::File::open(path).await?;
                let copied = tokio::io::copy(&mut file.take(*len), stream).await?;
                if copied < *len {
                    bail!(
                        "{} shrank while being sent: {} of {} bytes",
                        path.display(),
                        copied,
                        len
                    );
                }
            }
        }

        stream.flush().await?;
        Ok(())
    }
}
