//! Content-addressed blob uploads.
//!
//! The backend stores model weights as blobs keyed by SHA256 digest. Getting
//! a local file registered is a check-then-act protocol:
//! 1. Compute the file's digest (streaming, off the async scheduler)
//! 2. `HEAD /api/blobs/sha256:{digest}` -- present means nothing to do
//! 3. `POST /api/blobs/sha256:{digest}` streaming the file if absent
//!
//! The file is read twice -- one pass to hash, one to upload -- because
//! whether the upload happens at all depends on the digest-keyed probe. Each
//! consumer opens a fresh stream; nothing is replayed.

use crate::config::BackendConfig;
use crate::error::{RemudaError, Result};
use crate::transport::{HttpBackend, Presence};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Uploads local files to the backend's content-addressed blob store.
pub struct BlobStore {
    backend: Arc<dyn HttpBackend>,
    config: BackendConfig,
}

impl BlobStore {
    /// Create a store over the given backend and connection config.
    pub fn new(backend: Arc<dyn HttpBackend>, config: BackendConfig) -> Self {
        Self { backend, config }
    }

    /// Ensure the backend holds the blob for a local file.
    ///
    /// Returns the `sha256:<hex>` digest. Uploads only when the backend's
    /// existence probe classifies the digest as absent; probe failures other
    /// than not-found propagate unchanged.
    pub async fn ensure_uploaded(&self, path: &Path) -> Result<String> {
        let digest = format!("sha256:{}", compute_sha256(path).await?);
        let url = self.config.blob_url(&digest);

        match self.backend.head(&url).await? {
            Presence::Present => {
                debug!("Blob {} already exists, skipping upload", digest);
            }
            Presence::Absent => {
                if !self.backend.supports_streamed_bodies() {
                    return Err(RemudaError::config(
                        "Streaming uploads are not supported by this backend",
                    ));
                }
                info!("Uploading blob {} from {}", digest, path.display());
                self.backend.post_file(&url, path).await?;
            }
        }

        Ok(digest)
    }
}

/// Compute the SHA256 of a file as lowercase hex.
///
/// Reads in 8 MB chunks on the blocking thread pool so large model files
/// never stall the async scheduler.
pub async fn compute_sha256(path: &Path) -> Result<String> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut file =
            std::fs::File::open(&path).map_err(|e| RemudaError::io_with_path(e, &path))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BackendConfig::CHUNK_SIZE];
        loop {
            let n = file
                .read(&mut buffer)
                .map_err(|e| RemudaError::io_with_path(e, &path))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(|e| RemudaError::Config {
        message: format!("SHA256 computation task failed: {}", e),
    })?
}
