//! Model creation client.
//!
//! [`ModelClient`] is the entry point for creating models: it validates the
//! request, loads and rewrites the modelfile (uploading any locally
//! referenced weights as blobs), then submits the create call. The HTTP
//! backend is injected, so everything here runs against a fake in tests.

use crate::blob::BlobStore;
use crate::config::BackendConfig;
use crate::error::{RemudaError, Result};
use crate::modelfile::ModelfileRewriter;
use crate::transport::{HttpBackend, ReqwestBackend};
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// A model-creation request.
///
/// Exactly one of `path` (a modelfile on disk) or `modelfile` (inline text)
/// must be set. `path` never goes over the wire; it is consumed client-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRequest {
    /// Name for the new model.
    pub model: String,
    /// Path to a modelfile on disk.
    #[serde(skip)]
    pub path: Option<PathBuf>,
    /// Inline modelfile text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modelfile: Option<String>,
    /// Optional quantization to apply server-side (e.g. `q4_K_M`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantize: Option<String>,
    /// Whether the backend should stream progress. Set by the client per
    /// call; the field exists so the wire shape matches the API.
    pub stream: bool,
}

impl CreateRequest {
    /// Serialize for the wire with the stream flag forced.
    fn to_body(&self, stream: bool) -> Result<Value> {
        let mut body = serde_json::to_value(self)?;
        body["stream"] = Value::Bool(stream);
        Ok(body)
    }
}

/// One progress line (or the final status) of a create call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Digest of the layer currently transferring, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

/// Client for the backend's model-creation API.
pub struct ModelClient {
    backend: Arc<dyn HttpBackend>,
    config: BackendConfig,
}

impl ModelClient {
    /// Create a client targeting the given base URL.
    ///
    /// If `host` is `None`, defaults to `http://127.0.0.1:11434`.
    pub fn new(host: Option<&str>) -> Self {
        let config = match host {
            Some(host) => BackendConfig::new(host),
            None => BackendConfig::default(),
        };
        Self::with_backend(Arc::new(ReqwestBackend::new()), config)
    }

    /// Create a client over an injected backend.
    pub fn with_backend(backend: Arc<dyn HttpBackend>, config: BackendConfig) -> Self {
        Self { backend, config }
    }

    /// Create a model, returning the final status once the backend is done.
    pub async fn create(&self, mut request: CreateRequest) -> Result<CreateStatus> {
        self.prepare_modelfile(&mut request).await?;
        info!("Creating model '{}'", request.model);

        let body = request.to_body(false)?;
        let value = self
            .backend
            .post_json(&self.config.create_url(), &body)
            .await?;
        into_status(value)
    }

    /// Create a model, returning a lazy stream of progress statuses.
    ///
    /// The stream is finite and not restartable; a progress line carrying an
    /// error surfaces as an `Err` item.
    pub async fn create_streaming(
        &self,
        mut request: CreateRequest,
    ) -> Result<BoxStream<'static, Result<CreateStatus>>> {
        self.prepare_modelfile(&mut request).await?;
        info!("Creating model '{}' (streaming)", request.model);

        let body = request.to_body(true)?;
        let lines = self
            .backend
            .post_json_lines(&self.config.create_url(), &body)
            .await?;
        Ok(lines.map(|item| item.and_then(into_status)).boxed())
    }

    /// Load the modelfile text, rewrite its directives, and fold the result
    /// back into the request.
    ///
    /// Validation happens before any filesystem or network access.
    async fn prepare_modelfile(&self, request: &mut CreateRequest) -> Result<()> {
        let (text, base_dir) = match (&request.path, &request.modelfile) {
            (Some(path), _) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| RemudaError::io_with_path(e, path.clone()))?;
                let base_dir = match path.parent() {
                    Some(parent) if parent != std::path::Path::new("") => parent.to_path_buf(),
                    _ => std::env::current_dir()?,
                };
                (text, base_dir)
            }
            (None, Some(text)) => (text.clone(), std::env::current_dir()?),
            (None, None) => {
                return Err(RemudaError::validation(
                    "Must provide either path or modelfile to create a model",
                ));
            }
        };

        debug!("Rewriting modelfile against {}", base_dir.display());
        let blobs = BlobStore::new(self.backend.clone(), self.config.clone());
        let rewriter = ModelfileRewriter::new(&blobs);
        request.modelfile = Some(rewriter.rewrite(&text, &base_dir).await?);
        request.path = None;
        Ok(())
    }
}

/// Decode a status object, surfacing a backend-reported error.
fn into_status(value: Value) -> Result<CreateStatus> {
    let mut status: CreateStatus = serde_json::from_value(value)?;
    if let Some(message) = status.error.take() {
        return Err(RemudaError::Backend { message });
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::FakeBackend;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn client(backend: FakeBackend) -> (Arc<FakeBackend>, ModelClient) {
        let backend = Arc::new(backend);
        let client = ModelClient::with_backend(backend.clone(), BackendConfig::default());
        (backend, client)
    }

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_create_requires_path_or_modelfile() {
        let (backend, client) = client(FakeBackend::new());
        let result = client
            .create(CreateRequest {
                model: "test".into(),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(RemudaError::Validation { .. })));
        // Failed before any backend traffic.
        assert_eq!(backend.head_calls.lock().unwrap().len(), 0);
        assert_eq!(backend.create_bodies.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_from_modelfile_path_rewrites_relative_refs() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "base.gguf", b"base weights");
        let modelfile_path = write_file(
            &dir,
            "Modelfile",
            b"FROM ./base.gguf\nPARAMETER temperature 0.7",
        );

        let (backend, client) = client(FakeBackend::new());
        let status = client
            .create(CreateRequest {
                model: "my-model".into(),
                path: Some(modelfile_path),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(status.status, "success");
        assert_eq!(backend.upload_count(), 1);

        let bodies = backend.create_bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["model"], "my-model");
        assert_eq!(bodies[0]["stream"], false);
        let modelfile = bodies[0]["modelfile"].as_str().unwrap();
        assert!(modelfile.starts_with("FROM @sha256:"));
        assert!(modelfile.ends_with("PARAMETER temperature 0.7"));
    }

    #[tokio::test]
    async fn test_create_from_inline_modelfile() {
        let dir = TempDir::new().unwrap();
        let weights = write_file(&dir, "base.gguf", b"base weights");

        // Absolute reference so the cwd-relative base dir does not matter.
        let text = format!("FROM {}", weights.display());
        let (backend, client) = client(FakeBackend::new());
        client
            .create(CreateRequest {
                model: "my-model".into(),
                modelfile: Some(text),
                ..Default::default()
            })
            .await
            .unwrap();

        let bodies = backend.create_bodies.lock().unwrap();
        let modelfile = bodies[0]["modelfile"].as_str().unwrap();
        assert!(modelfile.starts_with("FROM @sha256:"));
    }

    #[tokio::test]
    async fn test_quantize_is_passed_through() {
        let (backend, client) = client(FakeBackend::new());
        client
            .create(CreateRequest {
                model: "q".into(),
                modelfile: Some("FROM llama3".into()),
                quantize: Some("q4_K_M".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let bodies = backend.create_bodies.lock().unwrap();
        assert_eq!(bodies[0]["quantize"], "q4_K_M");
    }

    #[tokio::test]
    async fn test_quantize_absent_when_unset() {
        let (backend, client) = client(FakeBackend::new());
        client
            .create(CreateRequest {
                model: "q".into(),
                modelfile: Some("FROM llama3".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let bodies = backend.create_bodies.lock().unwrap();
        assert!(bodies[0].get("quantize").is_none());
    }

    #[tokio::test]
    async fn test_backend_error_field_surfaces() {
        let mut backend = FakeBackend::new();
        backend.create_response = json!({"error": "quantization failed"});
        let (_backend, client) = client(backend);

        let result = client
            .create(CreateRequest {
                model: "bad".into(),
                modelfile: Some("FROM llama3".into()),
                ..Default::default()
            })
            .await;

        match result {
            Err(RemudaError::Backend { message }) => assert_eq!(message, "quantization failed"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_streaming_yields_progress_then_errors() {
        let mut backend = FakeBackend::new();
        backend.create_lines = vec![
            json!({"status": "reading model metadata"}),
            json!({"status": "creating layer", "digest": "sha256:abc", "total": 10, "completed": 4}),
            json!({"error": "disk full"}),
        ];
        let (_backend, client) = client(backend);

        let stream = client
            .create_streaming(CreateRequest {
                model: "s".into(),
                modelfile: Some("FROM llama3".into()),
                stream: true,
                ..Default::default()
            })
            .await
            .unwrap();
        let items: Vec<_> = stream.collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().status, "reading model metadata");
        assert_eq!(items[1].as_ref().unwrap().completed, Some(4));
        assert!(matches!(items[2], Err(RemudaError::Backend { .. })));
    }

    #[tokio::test]
    async fn test_streaming_sets_stream_flag() {
        let (backend, client) = client(FakeBackend::new());
        let _ = client
            .create_streaming(CreateRequest {
                model: "s".into(),
                modelfile: Some("FROM llama3".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let bodies = backend.create_bodies.lock().unwrap();
        assert_eq!(bodies[0]["stream"], true);
    }

    #[tokio::test]
    async fn test_missing_modelfile_path_is_io_error() {
        let (_backend, client) = client(FakeBackend::new());
        let result = client
            .create(CreateRequest {
                model: "m".into(),
                path: Some(PathBuf::from("/nonexistent/Modelfile")),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(RemudaError::Io { .. })));
    }
}
