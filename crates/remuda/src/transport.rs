//! HTTP backend abstraction for the model-serving API.
//!
//! The orchestration layer talks to the backend through the [`HttpBackend`]
//! trait rather than a concrete HTTP client, so transports can be injected:
//! the production implementation drives reqwest, tests use a canned fake.

use crate::config::BackendConfig;
use crate::error::{RemudaError, Result};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Outcome of a blob existence probe.
///
/// Transport failures are errors, never `Absent`; only a classified
/// not-found response counts as absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The backend already has the blob.
    Present,
    /// The backend answered with a not-found status.
    Absent,
}

/// Capability interface over the backend's HTTP surface.
///
/// Mirrors the three request shapes the create flow needs: an existence
/// probe, a streamed raw-bytes upload, and JSON posts in single-response and
/// progress-stream form.
#[async_trait::async_trait]
pub trait HttpBackend: Send + Sync {
    /// Whether this backend can stream request bodies from disk.
    ///
    /// Checked before any blob upload is attempted.
    fn supports_streamed_bodies(&self) -> bool {
        true
    }

    /// HEAD-probe a URL, classifying not-found separately from failure.
    async fn head(&self, url: &str) -> Result<Presence>;

    /// POST the contents of a local file as a streamed raw body.
    async fn post_file(&self, url: &str, path: &Path) -> Result<()>;

    /// POST a JSON body and return the single JSON object response.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;

    /// POST a JSON body and return the response as a lazy sequence of
    /// newline-delimited JSON objects.
    async fn post_json_lines(&self, url: &str, body: &Value)
        -> Result<BoxStream<'static, Result<Value>>>;
}

/// Production backend driving reqwest.
///
/// Keeps three clients: short-timeout for probes, no-total-timeout for blob
/// uploads (large files), and a long timeout for create calls.
pub struct ReqwestBackend {
    client: reqwest::Client,
    upload_client: reqwest::Client,
    create_client: reqwest::Client,
}

impl ReqwestBackend {
    /// Build the client trio.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(BackendConfig::API_TIMEOUT)
            .user_agent("remuda")
            .build()
            .expect("failed to build reqwest client");

        let upload_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // No total timeout -- large blob uploads can take a while.
            .user_agent("remuda")
            .build()
            .expect("failed to build reqwest upload client");

        let create_client = reqwest::Client::builder()
            .timeout(BackendConfig::CREATE_TIMEOUT)
            .user_agent("remuda")
            .build()
            .expect("failed to build reqwest create client");

        Self {
            client,
            upload_client,
            create_client,
        }
    }

    /// Turn a non-success response into an [`RemudaError::UnexpectedStatus`].
    async fn unexpected_status(url: &str, response: reqwest::Response) -> RemudaError {
        let status = response.status().as_u16();
        let body: String = response.text().await.unwrap_or_default();
        RemudaError::UnexpectedStatus {
            status,
            url: url.to_string(),
            body,
        }
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HttpBackend for ReqwestBackend {
    async fn head(&self, url: &str) -> Result<Presence> {
        debug!("HEAD {}", url);
        let response = self.client.head(url).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(Presence::Present)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(Presence::Absent)
        } else {
            Err(Self::unexpected_status(url, response).await)
        }
    }

    async fn post_file(&self, url: &str, path: &Path) -> Result<()> {
        let file_size = tokio::fs::metadata(path)
            .await
            .map_err(|e| RemudaError::io_with_path(e, path))?
            .len();

        debug!("POST {} ({} bytes from {})", url, file_size, path.display());

        // Stream the file in chunks to avoid loading it all into memory.
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| RemudaError::io_with_path(e, path))?;

        let file_stream = stream::unfold(file, |mut file| async move {
            let mut buf = vec![0u8; BackendConfig::CHUNK_SIZE];
            match tokio::io::AsyncReadExt::read(&mut file, &mut buf).await {
                Ok(0) => None,
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok::<_, std::io::Error>(Bytes::from(buf)), file))
                }
                Err(e) => Some((Err(e), file)),
            }
        });

        let body = reqwest::Body::wrap_stream(file_stream);

        let response = self
            .upload_client
            .post(url)
            .header("Content-Length", file_size)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::unexpected_status(url, response).await);
        }
        Ok(())
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.create_client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(Self::unexpected_status(url, response).await);
        }
        Ok(response.json().await?)
    }

    async fn post_json_lines(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<BoxStream<'static, Result<Value>>> {
        let response = self.create_client.post(url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(Self::unexpected_status(url, response).await);
        }

        Ok(ndjson_lines(response.bytes_stream().boxed()).boxed())
    }
}

/// State threaded through the NDJSON `unfold` stream.
struct LineState {
    stream: BoxStream<'static, std::result::Result<Bytes, reqwest::Error>>,
    buf: BytesMut,
    done: bool,
}

/// Decode a byte stream into parsed JSON values, one per non-empty line.
///
/// A malformed line or an upstream transport failure terminates the stream
/// after yielding the error.
fn ndjson_lines(
    byte_stream: BoxStream<'static, std::result::Result<Bytes, reqwest::Error>>,
) -> impl futures::Stream<Item = Result<Value>> {
    let state = LineState {
        stream: byte_stream,
        buf: BytesMut::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            // Try to extract a complete line from the buffer.
            if let Some(pos) = st.buf.iter().position(|&b| b == b'\n') {
                let line = st.buf.split_to(pos + 1);
                let text = String::from_utf8_lossy(&line);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                return match serde_json::from_str::<Value>(trimmed) {
                    Ok(value) => Some((Ok(value), st)),
                    Err(e) => {
                        st.done = true;
                        Some((Err(e.into()), st))
                    }
                };
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    // Upstream finished; flush whatever is left in the buffer.
                    st.done = true;
                    let rest = String::from_utf8_lossy(&st.buf).trim().to_string();
                    if rest.is_empty() {
                        return None;
                    }
                    return match serde_json::from_str::<Value>(&rest) {
                        Ok(value) => Some((Ok(value), st)),
                        Err(e) => Some((Err(e.into()), st)),
                    };
                }
            }
        }
    })
}

// ============================================================================
// Fake backend for tests
// ============================================================================
